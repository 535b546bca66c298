//! Frame identifiers and the decoding of raw "frame info" strings.
//!
//! The sampler hands us one string per stack entry:
//! `function \x00 file_path \x00 line_no`, optionally followed by
//! `\x01`-separated attributes (e.g. `\x01h1` for a hidden frame,
//! `\x01cHandler` for a method of class `Handler`).
//!
//! Synthetic entries (`[self]`, `[await]`, `[out-of-context]`) carry no
//! source location and decode to their own [`FrameKind`].

use crate::utils::config::{
    ATTRIBUTES_SEP, ATTRIBUTE_CLASS_NAME, ATTRIBUTE_HIDDEN, AWAIT_FRAME_IDENTIFIER, DUMMY_ROOT_FRAME_IDENTIFIER,
    IDENTIFIER_SEP, OUT_OF_CONTEXT_FRAME_IDENTIFIER, SELF_TIME_FRAME_IDENTIFIER,
};
use crate::utils::error::TreeError;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a real call site
///
/// Two frames with equal identifiers are the same call site for
/// aggregation purposes. Equality covers function, file, line and the
/// hidden marker; `class_name` is display information only.
#[derive(Debug, Clone)]
pub struct FrameIdentifier {
    pub function: String,
    pub file_path: String,
    pub line_no: u32,
    pub hidden: bool,

    /// Class of `self`/`cls` when the frame is a method
    pub class_name: Option<String>,
}

impl PartialEq for FrameIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
            && self.file_path == other.file_path
            && self.line_no == other.line_no
            && self.hidden == other.hidden
    }
}

impl Eq for FrameIdentifier {}

impl Hash for FrameIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.function.hash(state);
        self.file_path.hash(state);
        self.line_no.hash(state);
        self.hidden.hash(state);
    }
}

impl FrameIdentifier {
    pub fn new(function: impl Into<String>, file_path: impl Into<String>, line_no: u32) -> Self {
        Self {
            function: function.into(),
            file_path: file_path.into(),
            line_no,
            hidden: false,
            class_name: None,
        }
    }

    /// Mark this identifier as hidden
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

impl fmt::Display for FrameIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file_path, self.line_no)
    }
}

/// What a node in the frame tree stands for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A real call site
    Call(FrameIdentifier),

    /// Self-time carried as a distinct leaf
    SelfTime,

    /// Time spent awaiting
    Await,

    /// Time recorded while the profiled context was not active
    OutOfContext,

    /// Wrapper the tree builder places above the outermost frames
    DummyRoot,
}

impl FrameKind {
    /// Frames that do not correspond to real program frames
    pub fn is_synthetic(&self) -> bool {
        !matches!(self, FrameKind::Call(_))
    }

    /// Synthetic frames that can never have children
    pub fn is_synthetic_leaf(&self) -> bool {
        matches!(
            self,
            FrameKind::SelfTime | FrameKind::Await | FrameKind::OutOfContext
        )
    }

    pub fn identifier(&self) -> Option<&FrameIdentifier> {
        match self {
            FrameKind::Call(identifier) => Some(identifier),
            _ => None,
        }
    }

    /// Short label used in logs and JSON output
    pub fn label(&self) -> String {
        match self {
            FrameKind::Call(identifier) => identifier.to_string(),
            FrameKind::SelfTime => SELF_TIME_FRAME_IDENTIFIER.to_string(),
            FrameKind::Await => AWAIT_FRAME_IDENTIFIER.to_string(),
            FrameKind::OutOfContext => OUT_OF_CONTEXT_FRAME_IDENTIFIER.to_string(),
            FrameKind::DummyRoot => DUMMY_ROOT_FRAME_IDENTIFIER.to_string(),
        }
    }
}

/// Decode one stack entry into a [`FrameKind`]
///
/// # Errors
/// * `TreeError::MalformedRecord` - the identifier is not a 3-part
///   `function\x00file\x00line` key, or the line number is not numeric
pub fn parse_frame_info(frame_info: &str) -> Result<FrameKind, TreeError> {
    let (identifier, attributes) = match frame_info.split_once(ATTRIBUTES_SEP) {
        Some((identifier, attributes)) => (identifier, Some(attributes)),
        None => (frame_info, None),
    };

    match identifier {
        SELF_TIME_FRAME_IDENTIFIER => return Ok(FrameKind::SelfTime),
        AWAIT_FRAME_IDENTIFIER => return Ok(FrameKind::Await),
        OUT_OF_CONTEXT_FRAME_IDENTIFIER => return Ok(FrameKind::OutOfContext),
        _ => {}
    }

    let parts: Vec<&str> = identifier.split(IDENTIFIER_SEP).collect();
    let [function, file_path, line_no] = parts.as_slice() else {
        return Err(TreeError::MalformedRecord(format!(
            "expected 3 identifier parts, found {} in {:?}",
            parts.len(),
            identifier
        )));
    };

    let line_no: u32 = line_no.parse().map_err(|_| {
        TreeError::MalformedRecord(format!("invalid line number {:?} in {:?}", line_no, identifier))
    })?;

    let mut hidden = false;
    let mut class_name = None;
    for attribute in attributes.into_iter().flat_map(|attrs| attrs.split(ATTRIBUTES_SEP)) {
        if attribute == ATTRIBUTE_HIDDEN {
            hidden = true;
        } else if let Some(name) = attribute.strip_prefix(ATTRIBUTE_CLASS_NAME) {
            if !name.is_empty() {
                class_name = Some(name.to_string());
            }
        }
    }

    Ok(FrameKind::Call(FrameIdentifier {
        function: function.to_string(),
        file_path: file_path.to_string(),
        line_no,
        hidden,
        class_name,
    }))
}

/// Encode an identifier back into frame info form
pub fn to_frame_info(identifier: &FrameIdentifier) -> String {
    let mut info = format!(
        "{}{sep}{}{sep}{}",
        identifier.function,
        identifier.file_path,
        identifier.line_no,
        sep = IDENTIFIER_SEP
    );
    if let Some(class_name) = &identifier.class_name {
        info.push(ATTRIBUTES_SEP);
        info.push_str(ATTRIBUTE_CLASS_NAME);
        info.push_str(class_name);
    }
    if identifier.hidden {
        info.push(ATTRIBUTES_SEP);
        info.push_str(ATTRIBUTE_HIDDEN);
    }
    info
}
