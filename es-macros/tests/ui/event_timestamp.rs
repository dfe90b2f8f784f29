use es_domain::domain_event::{DomainEvent, Sequencing, timestamp_position};
use es_domain::persist::Sequenced;
use es_macros::domain_event;

#[domain_event]
enum JournalEvent {
    Started { title: String },
    #[event(topic = "journal.noted", sequencing = "timestamp")]
    Noted { text: String },
}

#[domain_event(sequencing = "timestamp")]
enum PingEvent {
    Pinged,
}

fn main() {
    let now = chrono::Utc::now();
    let noted = JournalEvent::Noted {
        originator_id: "j-1".to_string(),
        timestamp: now,
        text: "hello".to_string(),
    };
    assert_eq!(noted.originator_version(), None);
    assert_eq!(noted.sequencing(), Sequencing::Timestamp);
    assert_eq!(noted.position(), timestamp_position(&now));

    let started = JournalEvent::Started {
        originator_id: "j-1".to_string(),
        originator_version: 0,
        timestamp: now,
        title: "t".to_string(),
    };
    assert_eq!(started.sequencing(), Sequencing::Version);

    let ping = PingEvent::Pinged {
        originator_id: "p-1".to_string(),
        timestamp: now,
    };
    assert_eq!(ping.topic(), "PingEvent.Pinged");
    assert_eq!(ping.originator_version(), None);
}
