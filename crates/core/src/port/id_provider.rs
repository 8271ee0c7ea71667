// ID Provider Port (deterministic IDs in tests)

/// Kind of record an ID is minted for; used as a readable prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Item,
    Order,
    History,
}

impl RecordKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordKind::Item => "itm",
            RecordKind::Order => "ord",
            RecordKind::History => "his",
        }
    }
}

/// ID provider interface
pub trait IdProvider: Send + Sync {
    /// Generate a new unique ID for `kind`
    fn generate_id(&self, kind: RecordKind) -> String;
}

/// UUID v4 provider (production), e.g. `ord-6f1c...`
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self, kind: RecordKind) -> String {
        format!("{}-{}", kind.prefix(), uuid::Uuid::new_v4())
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// `itm-1`, `ord-2`, `his-3`, ...
    #[derive(Default)]
    pub struct SequentialIdProvider {
        counter: AtomicU64,
    }

    impl IdProvider for SequentialIdProvider {
        fn generate_id(&self, kind: RecordKind) -> String {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{}-{}", kind.prefix(), n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_ids_are_prefixed_and_unique() {
        let provider = UuidProvider;
        let a = provider.generate_id(RecordKind::Order);
        let b = provider.generate_id(RecordKind::Order);
        assert!(a.starts_with("ord-"));
        assert_ne!(a, b);
    }
}
