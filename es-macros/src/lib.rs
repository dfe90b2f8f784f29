//! 事件溯源过程宏（es-macros）
//!
//! - `#[entity]`：为结构体补齐 `id`/`version` 字段并实现 `::es_domain::entity::Entity`
//! - `#[domain_event]`：为事件枚举补齐来源字段（`originator_id`/`originator_version`/`timestamp`），
//!   并实现 `::es_domain::persist::Sequenced` 与 `::es_domain::domain_event::DomainEvent`
//!
use proc_macro::TokenStream;

mod domain_event;
mod entity;
mod utils;

/// 实体宏
///
/// 参数：`#[entity(id = IdType, debug = true|false)]`，`id` 默认 `String`。
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 领域事件宏
///
/// 参数：`#[domain_event(sequencing = "version" | "timestamp")]`，默认 `"version"`；
/// 变体可通过 `#[event(topic = "...", sequencing = "...")]` 覆写主题与排序方式。
#[proc_macro_attribute]
pub fn domain_event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}
