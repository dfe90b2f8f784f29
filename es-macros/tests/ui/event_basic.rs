use es_domain::domain_event::{DomainEvent, Sequencing};
use es_domain::persist::Sequenced;
use es_macros::domain_event;

#[domain_event]
enum BankEvent {
    #[event(topic = "bank.opened")]
    Opened { name: String },
    Renamed { to: String },
    Closed,
}

fn main() {
    let now = chrono::Utc::now();
    let opened = BankEvent::Opened {
        originator_id: "b-1".to_string(),
        originator_version: 0,
        timestamp: now,
        name: "main".to_string(),
    };
    assert_eq!(opened.sequence_id(), "b-1");
    assert_eq!(opened.originator_id(), "b-1");
    assert_eq!(opened.position(), 0);
    assert_eq!(opened.topic(), "bank.opened");
    assert_eq!(opened.originator_version(), Some(0));
    assert_eq!(opened.timestamp(), now);
    assert_eq!(opened.sequencing(), Sequencing::Version);

    let closed = BankEvent::Closed {
        originator_id: "b-1".to_string(),
        originator_version: 2,
        timestamp: now,
    };
    assert_eq!(closed.topic(), "BankEvent.Closed");
    assert_eq!(closed.position(), 2);

    assert_eq!(
        BankEvent::known_topics(),
        Some(&["bank.opened", "BankEvent.Renamed", "BankEvent.Closed"][..])
    );
}
