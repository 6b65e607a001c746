//! Agent capability flags
//!
//! Declares which optional entry points an agent implements.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Optional teardown entry points an agent implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AgentCapabilities: u8 {
        /// Implements `stop`
        const STOP = 0b0001;
        /// Implements `close`
        const CLOSE = 0b0010;
    }
}

impl Default for AgentCapabilities {
    fn default() -> Self {
        Self::empty()
    }
}

// Serialized as named booleans for readability in status payloads
impl Serialize for AgentCapabilities {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("AgentCapabilities", 2)?;
        state.serialize_field("stop", &self.contains(Self::STOP))?;
        state.serialize_field("close", &self.contains(Self::CLOSE))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for AgentCapabilities {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            stop: bool,
            #[serde(default)]
            close: bool,
        }

        let helper = Helper::deserialize(deserializer)?;
        let mut caps = Self::empty();
        caps.set(Self::STOP, helper.stop);
        caps.set(Self::CLOSE, helper.close);
        Ok(caps)
    }
}
