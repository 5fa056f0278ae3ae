use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use thiserror::Error;

use groupin_types::models::ParticipantId;

/// Default size of the identity space: identities are `0..1000`.
pub const DEFAULT_IDENTITY_SPACE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("all {space} identities are in use")]
    Full { space: u32 },
}

/// Proposes a first candidate for a new identity. The registry searches
/// onwards from it until it finds one that is free.
pub trait IdentitySource: Send + Sync {
    fn candidate(&self, space: u32) -> u32;
}

/// Wall-clock milliseconds modulo the identity space.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockIdentities;

impl IdentitySource for ClockIdentities {
    fn candidate(&self, space: u32) -> u32 {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        (millis % u128::from(space.max(1))) as u32
    }
}

/// Uniformly random candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentities;

impl IdentitySource for RandomIdentities {
    fn candidate(&self, space: u32) -> u32 {
        rand::rng().random_range(0..space.max(1))
    }
}

/// Owns the membership set. Identities are appended on join, removed on
/// leave, and never duplicated.
pub struct IdentityRegistry {
    members: Vec<ParticipantId>,
    space: u32,
    source: Box<dyn IdentitySource>,
}

impl IdentityRegistry {
    pub fn new(space: u32, source: Box<dyn IdentitySource>) -> Self {
        Self {
            members: Vec::new(),
            space: space.max(1),
            source,
        }
    }

    /// Issue an identity not currently held by anyone and append it.
    ///
    /// Starts from the source's candidate and searches upwards (wrapping)
    /// past identities already in use.
    pub fn join(&mut self) -> Result<ParticipantId, RegistryError> {
        let space = self.space;
        if self.members.len() >= space as usize {
            return Err(RegistryError::Full { space });
        }

        let start = u64::from(self.source.candidate(space) % space);
        let id = (0..u64::from(space))
            .map(|offset| ParticipantId(((start + offset) % u64::from(space)) as u32))
            .find(|id| !self.members.contains(id))
            .ok_or(RegistryError::Full { space })?;

        self.members.push(id);
        Ok(id)
    }

    /// Remove an identity. Returns false (and changes nothing) if it was
    /// not a member.
    pub fn leave(&mut self, id: ParticipantId) -> bool {
        let before = self.members.len();
        self.members.retain(|member| *member != id);
        self.members.len() != before
    }

    pub fn current_members(&self) -> &[ParticipantId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Always proposes the same identity, like two joins in the same millisecond.
    struct Fixed(u32);

    impl IdentitySource for Fixed {
        fn candidate(&self, _space: u32) -> u32 {
            self.0
        }
    }

    #[test]
    fn n_joins_give_n_distinct_members() {
        let mut registry = IdentityRegistry::new(DEFAULT_IDENTITY_SPACE, Box::new(ClockIdentities));
        for _ in 0..50 {
            registry.join().unwrap();
        }
        let members = registry.current_members();
        assert_eq!(members.len(), 50);
        let unique: HashSet<_> = members.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn colliding_candidates_are_retried() {
        let mut registry = IdentityRegistry::new(1000, Box::new(Fixed(42)));
        assert_eq!(registry.join().unwrap(), ParticipantId(42));
        assert_eq!(registry.join().unwrap(), ParticipantId(43));
        assert_eq!(registry.join().unwrap(), ParticipantId(44));
        assert_eq!(
            registry.current_members(),
            &[ParticipantId(42), ParticipantId(43), ParticipantId(44)]
        );
    }

    #[test]
    fn search_wraps_around_the_space() {
        let mut registry = IdentityRegistry::new(3, Box::new(Fixed(2)));
        assert_eq!(registry.join().unwrap(), ParticipantId(2));
        assert_eq!(registry.join().unwrap(), ParticipantId(0));
        assert_eq!(registry.join().unwrap(), ParticipantId(1));
    }

    #[test]
    fn full_space_is_an_error_and_leaves_members_intact() {
        let mut registry = IdentityRegistry::new(2, Box::new(Fixed(0)));
        registry.join().unwrap();
        registry.join().unwrap();
        assert_eq!(registry.join(), Err(RegistryError::Full { space: 2 }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn leave_removes_and_is_idempotent() {
        let mut registry = IdentityRegistry::new(1000, Box::new(Fixed(5)));
        let a = registry.join().unwrap();
        let b = registry.join().unwrap();

        assert!(registry.leave(a));
        assert_eq!(registry.current_members(), &[b]);

        assert!(!registry.leave(a));
        assert!(!registry.leave(ParticipantId(999)));
        assert_eq!(registry.current_members(), &[b]);

        assert!(registry.leave(b));
        assert!(registry.is_empty());
    }

    #[test]
    fn freed_identity_can_be_reissued() {
        let mut registry = IdentityRegistry::new(1000, Box::new(Fixed(9)));
        let a = registry.join().unwrap();
        registry.leave(a);
        assert_eq!(registry.join().unwrap(), a);
    }

    #[test]
    fn sources_stay_inside_the_space() {
        for _ in 0..100 {
            assert!(RandomIdentities.candidate(10) < 10);
            assert!(ClockIdentities.candidate(10) < 10);
        }
        assert_eq!(RandomIdentities.candidate(0), 0);
    }
}
