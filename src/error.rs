// SPDX-License-Identifier: (MIT OR Apache-2.0)

use thiserror::Error;

use crate::keyword::SetupOutcome;

/// The master error structure for a single rule parse attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigError {
    /// Rule bytes were not valid UTF-8. Only reachable from the `&[u8]`-taking
    /// entry point; the `&str` entry point cannot produce this by construction.
    #[error("rule is not valid UTF-8")]
    BadUtf8,

    /// A control character other than HT/LF/CR appeared in the rule text.
    #[error("rule contains a disallowed control character")]
    BadControlChar,

    /// No `(` was found to open the option list.
    #[error("missing option list: expected '('")]
    MissingOptionOpen,

    /// The option list was not closed, or an escaped/quoted value ran off the
    /// end of the rule before terminating.
    #[error("unterminated option: {0}")]
    UnterminatedOption(String),

    /// The rule was empty or whitespace-only.
    #[error("empty rule")]
    EmptyRule,

    /// A header field was missing or malformed.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The action name was not recognized.
    #[error("unknown action '{0}'")]
    UnknownAction(String),

    /// The action/scope combination is not allowed.
    #[error("action '{action}' does not permit scope '{scope}'")]
    ActionScopeNotAllowed { action: String, scope: String },

    /// `pass` cannot appear in a firewall rule.
    #[error("'pass' is not allowed in firewall rules")]
    PassNotFirewallCompatible,

    /// `accept` can only appear in a firewall rule.
    #[error("'accept' is only allowed in firewall rules")]
    AcceptRequiresFirewall,

    /// The protocol name resolved to neither a network protocol nor an
    /// app-layer protocol.
    #[error("unknown protocol '{0}'")]
    UnknownProtocol(String),

    /// Protocol/hook text exceeded the 32-byte limit.
    #[error("protocol/hook specifier too long (max 32 bytes)")]
    ProtoHookTooLong,

    /// The hook name is not valid for this rule's protocol level.
    #[error("unknown hook '{hook}' for protocol '{proto}'")]
    UnknownHook { proto: String, hook: String },

    /// No `<proto>:<hook>:generic` buffer is registered for an app-level hook.
    #[error("no generic buffer registered for {proto}:{hook}")]
    MissingGenericBuffer { proto: String, hook: String },

    /// The direction marker was not one of `->`, `<>`, `=>`.
    #[error("unknown direction marker '{0}'")]
    UnknownDirection(String),

    /// `=>` (TXBOTHDIR) is not allowed in firewall rules.
    #[error("'=>' direction is not allowed in firewall rules")]
    TxBothDirNotFirewallCompatible,

    /// `any` cannot be negated.
    #[error("'any' cannot be negated")]
    NegatedAny,

    /// The address collaborator rejected a source/destination literal.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// The port collaborator rejected a source/destination port literal.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// An option name was not found in the keyword registry.
    #[error("unknown rule keyword '{0}'")]
    UnknownKeyword(String),

    /// A `NOOPT` keyword was given a value, or a mandatory-value keyword was
    /// given none.
    #[error("keyword '{0}' value requirement violated")]
    OptionValueMismatch(String),

    /// A keyword's quoting requirement was violated.
    #[error("keyword '{0}' quoting requirement violated")]
    QuotingMismatch(String),

    /// A keyword's `Setup` reported a hard error.
    #[error("keyword '{keyword}' rejected its value: {message}")]
    SetupFailed { keyword: String, message: String },

    /// `sid` is required and did not appear in the rule.
    #[error("rule has no 'sid'")]
    MissingSid,

    /// A semantic/assembly-time violation raised by the signature builder
    /// (content modifier misuse, buffer cap exceeded, relative-offset errors).
    #[error("{0}")]
    Semantic(String),

    /// A cross-cutting validator check failed.
    #[error("{0}")]
    Validation(String),
}

impl SigError {
    /// Translates a keyword's [`SetupOutcome`] into the corresponding hard
    /// error, if it is one. Silent outcomes are handled by the caller instead
    /// of being turned into an error.
    pub(crate) fn from_setup_failure(keyword: &str, outcome: &SetupOutcome) -> Option<Self> {
        match outcome {
            SetupOutcome::Applied => None,
            SetupOutcome::Error(message) => Some(SigError::SetupFailed {
                keyword: keyword.to_string(),
                message: message.clone(),
            }),
            SetupOutcome::SilentOnce(_) | SetupOutcome::SilentOk | SetupOutcome::RequiresNotMet => {
                None
            }
        }
    }
}

/// Outcome of parsing a single rule, including the quiet-skip paths that are
/// not hard errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome<T> {
    /// The rule parsed and validated successfully.
    Parsed(T),
    /// The rule was dropped without a user-visible error: a `requires`
    /// predicate failed, or a keyword's silent-error path was hit.
    SilentSkip(String),
    /// The rule was rejected by the duplicate detector in favor of an
    /// existing, higher-or-equal revision signature.
    DuplicateDropped,
}

cfg_if::cfg_if! {
    if #[cfg(feature = "verbose-error")] {
        pub(crate) type OurNomError<'a> = nom::error::VerboseError<&'a str>;
    } else {
        pub(crate) type OurNomError<'a> = nom::error::Error<&'a str>;
    }
}

pub(crate) type NomRes<'a, T> = nom::IResult<&'a str, T, OurNomError<'a>>;

#[cfg(feature = "verbose-error")]
impl From<nom::Err<OurNomError<'_>>> for SigError {
    fn from(err: nom::Err<OurNomError<'_>>) -> SigError {
        let message = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => e
                .errors
                .into_iter()
                .map(|(remainder, kind)| format!("{kind:?} near '{remainder}'"))
                .collect::<Vec<_>>()
                .join("; "),
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
        };
        SigError::MalformedHeader(message)
    }
}

#[cfg(not(feature = "verbose-error"))]
impl From<nom::Err<OurNomError<'_>>> for SigError {
    fn from(err: nom::Err<OurNomError<'_>>) -> SigError {
        let message = match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => format!("{:?}", e.code),
            nom::Err::Incomplete(_) => "incomplete input".to_string(),
        };
        SigError::MalformedHeader(message)
    }
}
