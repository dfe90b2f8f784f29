//! 主题注册表
//!
//! 由类型声明的主题表构建；构建时拒绝重复主题，解码前校验主题是否已注册。
//!
use crate::error::{DomainError, DomainResult as Result};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    // None 表示不限制主题（例如快照：主题为实体类型名）
    topics: Option<HashSet<&'static str>>,
}

impl TopicRegistry {
    pub fn open() -> Self {
        Self { topics: None }
    }

    pub fn from_topics(topics: &[&'static str]) -> Result<Self> {
        let mut set = HashSet::with_capacity(topics.len());
        for topic in topics {
            if !set.insert(*topic) {
                return Err(DomainError::DuplicateTopic {
                    topic: topic.to_string(),
                });
            }
        }
        Ok(Self { topics: Some(set) })
    }

    pub fn from_known(known: Option<&'static [&'static str]>) -> Result<Self> {
        match known {
            Some(topics) => Self::from_topics(topics),
            None => Ok(Self::open()),
        }
    }

    pub fn resolve(&self, topic: &str) -> Result<()> {
        match &self.topics {
            Some(topics) if !topics.contains(topic) => Err(DomainError::UnknownEventType {
                topic: topic.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn len(&self) -> Option<usize> {
        self.topics.as_ref().map(HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_rejected_at_construction() {
        let err = TopicRegistry::from_topics(&["a", "b", "a"]).unwrap_err();
        match err {
            DomainError::DuplicateTopic { topic } => assert_eq!(topic, "a"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_topics_fail_to_resolve() {
        let registry = TopicRegistry::from_topics(&["a", "b"]).unwrap();
        assert_eq!(registry.len(), Some(2));
        registry.resolve("a").unwrap();
        assert!(matches!(
            registry.resolve("c"),
            Err(DomainError::UnknownEventType { .. })
        ));

        TopicRegistry::open().resolve("anything").unwrap();
    }
}
