use crate::Degradation;
use models::{AlertNotification, DashAlertSettings};
use std::collections::HashMap;

/// ChannelResolver looks up legacy notification channels.
pub trait ChannelResolver {
    fn by_id(&self, id: i64) -> Option<&AlertNotification>;
    fn by_uid(&self, uid: &str) -> Option<&AlertNotification>;
}

/// ChannelCache is a ChannelResolver over the channels of an organization.
#[derive(Debug, Default)]
pub struct ChannelCache {
    channels: Vec<AlertNotification>,
    by_id: HashMap<i64, usize>,
    by_uid: HashMap<String, usize>,
}

impl ChannelCache {
    pub fn new(channels: Vec<AlertNotification>) -> Self {
        let mut by_id = HashMap::with_capacity(channels.len());
        let mut by_uid = HashMap::with_capacity(channels.len());

        for (index, channel) in channels.iter().enumerate() {
            by_id.insert(channel.id, index);
            if !channel.uid.is_empty() {
                by_uid.insert(channel.uid.clone(), index);
            }
        }
        Self {
            channels,
            by_id,
            by_uid,
        }
    }
}

impl ChannelResolver for ChannelCache {
    fn by_id(&self, id: i64) -> Option<&AlertNotification> {
        self.by_id.get(&id).map(|index| &self.channels[*index])
    }
    fn by_uid(&self, uid: &str) -> Option<&AlertNotification> {
        self.by_uid.get(uid).map(|index| &self.channels[*index])
    }
}

/// Resolve the notification channels of a legacy alert.
/// A reference may hold either an ID or a UID, and the ID is tried first.
/// Unresolved references are logged and skipped.
pub fn extract_channels<R: ChannelResolver + ?Sized>(
    resolver: &R,
    settings: &DashAlertSettings,
    degraded: &mut Vec<Degradation>,
) -> Vec<AlertNotification> {
    let mut channels = Vec::with_capacity(settings.notifications.len());

    for key in &settings.notifications {
        let found = (key.id > 0)
            .then(|| resolver.by_id(key.id))
            .flatten()
            .or_else(|| (!key.uid.is_empty()).then(|| resolver.by_uid(&key.uid)).flatten());

        match found {
            Some(channel) => channels.push(channel.clone()),
            None => {
                tracing::warn!(id = key.id, uid = %key.uid, "failed to get alert notification, skipping");
                degraded.push(Degradation::UnresolvedChannel { key: key.clone() });
            }
        }
    }
    channels
}
