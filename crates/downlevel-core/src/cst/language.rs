//! Rowan language implementation for C#
//!
//! Connects `CsSyntaxKind` to rowan's generic CST infrastructure.

use rowan::Language;

use super::CsSyntaxKind;

/// Zero-sized marker type implementing `rowan::Language` for C#
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CsLanguage;

impl Language for CsLanguage {
    type Kind = CsSyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        CsSyntaxKind::from_raw(raw.0)
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind as u16)
    }
}
