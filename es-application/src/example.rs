//! 示例实体（Example）
//!
//! 两个整数属性 `a`/`b`；创建与属性修改按版本排序，备注按时间排序。
//!
use crate::error::AppError;
use chrono::Utc;
use es_domain::{aggregate::Aggregate, entity::Entity};
use es_macros::{domain_event, entity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[entity(id = Uuid)]
#[derive(PartialEq)]
pub struct Example {
    a: i64,
    b: i64,
}

impl Example {
    pub fn a(&self) -> i64 {
        self.a
    }

    pub fn b(&self) -> i64 {
        self.b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExampleAttribute {
    A,
    B,
}

#[domain_event]
pub enum ExampleEvent {
    #[event(topic = "example.created")]
    Created { a: i64, b: i64 },
    #[event(topic = "example.attribute_changed")]
    AttributeChanged {
        attribute: ExampleAttribute,
        value: i64,
    },
    #[event(topic = "example.noted", sequencing = "timestamp")]
    Noted { text: String },
}

#[derive(Debug)]
pub enum ExampleCommand {
    Create { a: i64, b: i64 },
    Set { attribute: ExampleAttribute, value: i64 },
    AddNote { text: String },
}

impl Example {
    fn ensure_created(&self) -> Result<(), AppError> {
        if self.version() == 0 {
            return Err(AppError::NotFound(self.id().to_string()));
        }
        Ok(())
    }
}

impl Aggregate for Example {
    const TYPE: &'static str = "example";
    type Command = ExampleCommand;
    type Event = ExampleEvent;
    type Error = AppError;

    fn execute(&self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let originator_id = self.id().to_string();
        let timestamp = Utc::now();
        match command {
            ExampleCommand::Create { a, b } => {
                if self.version() != 0 {
                    return Err(AppError::Validation(format!(
                        "example {originator_id} already exists"
                    )));
                }
                Ok(vec![ExampleEvent::Created {
                    originator_id,
                    originator_version: 0,
                    timestamp,
                    a,
                    b,
                }])
            }
            ExampleCommand::Set { attribute, value } => {
                self.ensure_created()?;
                Ok(vec![ExampleEvent::AttributeChanged {
                    originator_id,
                    originator_version: self.version(),
                    timestamp,
                    attribute,
                    value,
                }])
            }
            ExampleCommand::AddNote { text } => {
                self.ensure_created()?;
                if text.trim().is_empty() {
                    return Err(AppError::Validation("note must not be empty".into()));
                }
                Ok(vec![ExampleEvent::Noted {
                    originator_id,
                    timestamp,
                    text,
                }])
            }
        }
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ExampleEvent::Created { a, b, .. } => {
                self.a = *a;
                self.b = *b;
            }
            ExampleEvent::AttributeChanged {
                attribute, value, ..
            } => match attribute {
                ExampleAttribute::A => self.a = *value,
                ExampleAttribute::B => self.b = *value,
            },
            ExampleEvent::Noted { .. } => {}
        }
    }
}
