use crate::events::{RemoteParticipant, TrackPublication};

/// Remote participants currently in the room.
///
/// Updated by the session loop. The view features at most one of them.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRoster {
    participants: Vec<RemoteParticipant>,
    featured: Option<String>,
}

impl ParticipantRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_participant(&mut self, participant: RemoteParticipant) {
        if !self.participants.iter().any(|p| p.identity == participant.identity) {
            self.participants.push(participant);
        }
    }

    pub fn remove_participant(&mut self, identity: &str) {
        self.participants.retain(|p| p.identity != identity);
        if self.featured.as_deref() == Some(identity) {
            self.featured = None;
        }
    }

    pub fn participants(&self) -> &[RemoteParticipant] {
        &self.participants
    }

    pub fn participant(&self, identity: &str) -> Option<&RemoteParticipant> {
        self.participants.iter().find(|p| p.identity == identity)
    }

    /// Record a track change so later lookups see the latest subscription state.
    pub fn update_track(&mut self, identity: &str, track: &TrackPublication) {
        let Some(participant) = self.participants.iter_mut().find(|p| p.identity == identity) else {
            return;
        };
        match participant.tracks.iter_mut().find(|t| t.sid == track.sid) {
            Some(existing) => *existing = track.clone(),
            None => participant.tracks.push(track.clone()),
        }
    }

    pub fn remove_track(&mut self, identity: &str, track_sid: &str) {
        if let Some(participant) = self.participants.iter_mut().find(|p| p.identity == identity) {
            participant.tracks.retain(|t| t.sid != track_sid);
        }
    }

    pub fn set_featured(&mut self, identity: Option<String>) {
        self.featured = identity;
    }

    pub fn featured(&self) -> Option<&str> {
        self.featured.as_deref()
    }

    pub fn is_featured(&self, identity: &str) -> bool {
        self.featured.as_deref() == Some(identity)
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
        self.featured = None;
    }
}
