use es_domain::entity::Entity;
use es_macros::entity;

#[entity(id = uuid::Uuid)]
struct Account {
    name: String,
}

#[entity(debug = false)]
struct Note {
    text: String,
}

impl std::fmt::Debug for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Note({})", self.id)
    }
}

fn main() {
    let id = uuid::Uuid::new_v4();
    let mut account = Account::new(id, 0);
    assert_eq!(account.id(), &id);
    assert_eq!(account.version(), 0);
    assert!(account.name.is_empty());
    account.set_version(3);
    assert_eq!(account.clone().version(), 3);

    // 版本不参与序列化
    let json = serde_json::to_value(&account).unwrap();
    assert!(json.get("version").is_none());
    let restored: Account = serde_json::from_value(json).unwrap();
    assert_eq!(restored.id(), &id);
    assert_eq!(restored.version(), 0);

    let note = Note::new("n-1".to_string(), 2);
    assert_eq!(format!("{note:?}"), "Note(n-1)");
    assert!(note.text.is_empty());
}
