//! Message boxes.
//!
//! A message box holds one or more *targets*. The first target normally
//! sends to the box outlet; every later target starts with an escaped
//! semicolon followed by a receiver name. Within a target, messages are
//! separated by escaped commas:
//!
//! ```text
//! #X msg 10 10 1 \, 2 \; pd dsp 1;
//!              ^^^^^^^^^ outlet: [1], [2]
//!                        ^^^^^^^^^^^ pd: [dsp 1]
//! ```

use serde::{Deserialize, Serialize};

/// One destination of a message box with the messages sent to it.
///
/// A target without an address sends to the box outlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    messages: Vec<Vec<String>>,
}

impl MessageTarget {
    pub fn new(address: Option<String>, messages: Vec<Vec<String>>) -> Self {
        Self { address, messages }
    }

    /// A target sending to the box outlet.
    pub fn outlet(messages: Vec<Vec<String>>) -> Self {
        Self::new(None, messages)
    }

    /// A target sending to the receiver `address`.
    pub fn send(address: impl Into<String>, messages: Vec<Vec<String>>) -> Self {
        Self::new(Some(address.into()), messages)
    }

    /// The receiver name; `None` for the box outlet.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Returns `true` when this target sends to the box outlet.
    pub fn is_outlet(&self) -> bool {
        self.address.is_none()
    }

    /// Messages as lists of unescaped atoms.
    pub fn messages(&self) -> &[Vec<String>] {
        &self.messages
    }
}

/// A message box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    targets: Vec<MessageTarget>,
}

impl Message {
    pub fn new(targets: Vec<MessageTarget>) -> Self {
        Self { targets }
    }

    /// Build a message box from its unescaped atoms.
    ///
    /// `";"` atoms start a new target whose first atom is the address and
    /// `","` atoms separate messages inside a target.
    pub fn from_atoms(atoms: &[String]) -> Self {
        let mut targets = Vec::new();
        for (index, segment) in atoms.split(|atom| atom == ";").enumerate() {
            let (address, body) = if index == 0 {
                (None, segment)
            } else {
                match segment.split_first() {
                    Some((address, body)) => (Some(address.clone()), body),
                    None => continue,
                }
            };
            if index == 0 && body.is_empty() {
                continue;
            }
            let messages = body
                .split(|atom| atom == ",")
                .map(<[String]>::to_vec)
                .collect();
            targets.push(MessageTarget::new(address, messages));
        }
        Self { targets }
    }

    /// The inverse of [`Message::from_atoms`].
    pub fn to_atoms(&self) -> Vec<String> {
        let mut atoms = Vec::new();
        for target in &self.targets {
            if let Some(address) = &target.address {
                atoms.push(";".to_string());
                atoms.push(address.clone());
            }
            for (index, message) in target.messages.iter().enumerate() {
                if index > 0 {
                    atoms.push(",".to_string());
                }
                atoms.extend(message.iter().cloned());
            }
        }
        atoms
    }

    pub fn targets(&self) -> &[MessageTarget] {
        &self.targets
    }
}
