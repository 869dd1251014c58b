use std::collections::HashSet;

use crate::ids::ChannelId;

/// Voice channels under observation. Fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct MonitoredChannels {
    ids: HashSet<ChannelId>,
}

impl MonitoredChannels {
    pub fn new<I, C>(ids: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChannelId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// An absent channel (user not in voice) is never monitored.
    pub fn contains(&self, id: Option<&ChannelId>) -> bool {
        id.is_some_and(|id| self.ids.contains(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
