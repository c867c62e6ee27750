//! Typed device requests.
//!
//! Thin builders over [`Session::send`] and [`Session::request_and_correlate`].
//! Fire-and-observe requests return true once the write succeeded; their
//! replies arrive as [`Event::MessageReceived`](crate::Event::MessageReceived).
//! The template name fetches wait for the correlated reply and parse it.

use serde::Serialize;

use crate::protocol::{ProtocolMessage, parse_template_names};
use crate::session::Session;
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    // ==================== Status Queries ====================

    /// Requests the system status.
    pub async fn get_system_status(&self) -> bool {
        self.send(&ProtocolMessage::system_status_request()).await
    }

    /// Requests the printing status of a print group (0 is the default group).
    pub async fn get_printing_status(&self, group_id: i32) -> bool {
        self.send(&ProtocolMessage::printing_status_request(group_id))
            .await
    }

    /// Requests test information.
    pub async fn get_test_information(&self) -> bool {
        self.send(&ProtocolMessage::test_information_request())
            .await
    }

    // ==================== Print Control ====================

    /// Starts printing a template stored on the controller.
    pub async fn start_printing(&self, template_name: &str) -> bool {
        self.send(&ProtocolMessage::start_printing_request(template_name))
            .await
    }

    /// Pushes dynamic content.
    ///
    /// `data` is serialized as the `data` field next to `content_type`;
    /// [`DynamicContent`](crate::DynamicContent) covers the usual text and
    /// image case.
    pub async fn send_dynamic_content<D: Serialize + ?Sized>(
        &self,
        content_type: &str,
        data: &D,
    ) -> bool {
        match ProtocolMessage::dynamic_data_request(content_type, data) {
            Ok(message) => self.send(&message).await,
            Err(e) => {
                self.dispatcher()
                    .error(format!("failed to build dynamic content: {e}"));
                false
            }
        }
    }

    // ==================== Template Names ====================

    /// Fetches the names of recently used templates from the printing cache.
    ///
    /// Returns `None` if no usable reply arrived in time.
    pub async fn get_recent_template_names(&self) -> Option<Vec<String>> {
        self.fetch_template_names(&ProtocolMessage::printing_cache_request())
            .await
    }

    /// Fetches the template names recorded in the printing log.
    ///
    /// Returns `None` if no usable reply arrived in time.
    pub async fn get_printing_log_template_names(&self) -> Option<Vec<String>> {
        self.fetch_template_names(&ProtocolMessage::printing_log_request())
            .await
    }

    async fn fetch_template_names(&self, request: &ProtocolMessage) -> Option<Vec<String>> {
        let payload = self
            .request_and_correlate(request, self.config().reply_timeout)
            .await?;

        match parse_template_names(&payload) {
            Ok(names) => {
                tracing::debug!("{} returned {} template names", request.kind(), names.len());
                Some(names)
            }
            Err(e) => {
                tracing::debug!("unparseable {} reply: {}", request.kind(), e);
                None
            }
        }
    }
}
