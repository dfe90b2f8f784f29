//! 事件溯源持久化核心（es-domain）
//!
//! 通过重放只追加、按位置排序的事件日志重建实体的当前或历史状态：
//! - 实体（`entity`）、聚合（`aggregate`）与领域事件（`domain_event`）建模
//! - 序列项存储、记录策略、加密、快照、事件重放与仓储（`persist`）
//! - 进程内发布/订阅通道与持久化策略（`eventing`）
//! - 命令编排（`aggregate_root`）
//!
//! 并发安全依赖存储边界上的乐观并发：同一序列同一位置的两次写入只有一次成功。
//!
//! 典型用法：
//! 1. 用 `#[entity]`/`#[domain_event]` 定义实体与事件，实现 `Aggregate` 的 `execute/apply`；
//! 2. 选择记录策略（内存或 Postgres）构建 `SequencedItemStore`，按需配置 `Cipher`；
//! 3. 以 `CombinedPersistencePolicy` 订阅 `EventChannel`，以 `EventSourcedRepository` 查询实体；
//! 4. 通过 `AggregateRoot` 执行命令。
//!
pub mod aggregate;
pub mod aggregate_root;
pub mod domain_event;
pub mod entity;
pub mod error;
pub mod eventing;
pub mod persist;

// 允许在本 crate 内部通过 ::es_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::es_domain 路径。
extern crate self as es_domain;
