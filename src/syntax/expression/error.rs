//! Expression parse error kinds.

use std::fmt;

/// What the parser expected when it stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionErrorKind {
    /// `@(` where item references are not allowed.
    ItemsDisallowed,
    /// `%(` where metadata references are not allowed.
    MetadataDisallowed,
    ExpectingPropertyName,
    ExpectingItemName,
    ExpectingMetadataName,
    ExpectingMetadataOrItemName,
    ExpectingRightParen,
    ExpectingRightParenOrPeriod,
    ExpectingRightParenOrDash,
    ExpectingRightParenOrComma,
    ExpectingRightAngleBracket,
    ExpectingRightBracket,
    ExpectingMethodName,
    ExpectingMethodOrTransform,
    ExpectingLeftParen,
    ExpectingValue,
    ExpectingClassName,
    ExpectingBracketColonColon,
    ExpectingApostrophe,
    IncompleteString,
}

impl ExpressionErrorKind {
    /// Whether the error is a structural "expected X" failure rather than a
    /// legality error for a well-formed construct.
    pub fn is_incomplete(self) -> bool {
        !matches!(self, Self::ItemsDisallowed | Self::MetadataDisallowed)
    }
}

impl fmt::Display for ExpressionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::ItemsDisallowed => "Item references are not allowed here",
            Self::MetadataDisallowed => "Metadata references are not allowed here",
            Self::ExpectingPropertyName => "Expecting property name",
            Self::ExpectingItemName => "Expecting item name",
            Self::ExpectingMetadataName => "Expecting metadata name",
            Self::ExpectingMetadataOrItemName => "Expecting metadata or item name",
            Self::ExpectingRightParen => "Expecting ')'",
            Self::ExpectingRightParenOrPeriod => "Expecting ')' or '.'",
            Self::ExpectingRightParenOrDash => "Expecting ')' or '->'",
            Self::ExpectingRightParenOrComma => "Expecting ')' or ','",
            Self::ExpectingRightAngleBracket => "Expecting '>'",
            Self::ExpectingRightBracket => "Expecting ']'",
            Self::ExpectingMethodName => "Expecting method name",
            Self::ExpectingMethodOrTransform => "Expecting method name or transform",
            Self::ExpectingLeftParen => "Expecting '('",
            Self::ExpectingValue => "Expecting value",
            Self::ExpectingClassName => "Expecting class name",
            Self::ExpectingBracketColonColon => "Expecting ']::'",
            Self::ExpectingApostrophe => "Expecting closing apostrophe",
            Self::IncompleteString => "Unterminated string",
        };
        f.write_str(msg)
    }
}
