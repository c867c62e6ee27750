//! Command kinds for the Yacode protocol.
//!
//! Every frame on the wire carries one of these codes. The set is closed:
//! the controller firmware rejects anything else, so decoding an unknown code
//! yields no message at all.

use std::fmt;

/// Operation identifiers understood by the controller firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CommandKind {
    // Status queries
    /// Query overall system status. Also used as the connection probe.
    SystemStatus = 0x0001,
    /// Query printing status for a print group.
    PrintingStatus = 0x0002,
    /// Query test/diagnostic information.
    TestInformation = 0x0003,

    // Print control
    /// Start printing a stored template.
    StartPrinting = 0x0101,
    /// Push dynamic content (text and optional image) to the print buffer.
    SetDynamicData = 0x0102,

    // Template bookkeeping
    /// Fetch the templates held in the printing cache.
    GetPrintingCache = 0x0201,
    /// Fetch the printing log.
    GetPrintingLog = 0x0202,
}

impl CommandKind {
    /// All command kinds, in wire-code order.
    pub const ALL: [Self; 7] = [
        Self::SystemStatus,
        Self::PrintingStatus,
        Self::TestInformation,
        Self::StartPrinting,
        Self::SetDynamicData,
        Self::GetPrintingCache,
        Self::GetPrintingLog,
    ];

    /// Attempts to parse a command kind from its wire code.
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0001 => Some(Self::SystemStatus),
            0x0002 => Some(Self::PrintingStatus),
            0x0003 => Some(Self::TestInformation),
            0x0101 => Some(Self::StartPrinting),
            0x0102 => Some(Self::SetDynamicData),
            0x0201 => Some(Self::GetPrintingCache),
            0x0202 => Some(Self::GetPrintingLog),
            _ => None,
        }
    }

    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the protocol name of this command.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SystemStatus => "SYSTEM_STATUS",
            Self::PrintingStatus => "PRINTING_STATUS",
            Self::TestInformation => "TEST_INFORMATION",
            Self::StartPrinting => "START_PRINTING",
            Self::SetDynamicData => "SET_DYNAMIC_DATA",
            Self::GetPrintingCache => "GET_PRINTING_CACHE",
            Self::GetPrintingLog => "GET_PRINTING_LOG",
        }
    }
}

impl From<CommandKind> for u16 {
    fn from(kind: CommandKind) -> Self {
        kind as Self
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_values() {
        assert_eq!(CommandKind::SystemStatus as u16, 0x0001);
        assert_eq!(CommandKind::StartPrinting as u16, 0x0101);
        assert_eq!(CommandKind::GetPrintingCache as u16, 0x0201);
        assert_eq!(CommandKind::GetPrintingLog as u16, 0x0202);
    }

    #[test]
    fn test_from_code_covers_all() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(CommandKind::from_code(0x0000), None);
        assert_eq!(CommandKind::from_code(0xFFFF), None);
    }

    #[test]
    fn test_display_uses_protocol_name() {
        assert_eq!(CommandKind::StartPrinting.to_string(), "START_PRINTING");
        let code: u16 = CommandKind::SetDynamicData.into();
        assert_eq!(code, 0x0102);
    }
}
