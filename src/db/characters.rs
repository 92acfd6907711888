use std::sync::Arc;

use dashmap::DashMap;

use crate::db::IdGenerator;
use crate::models::character::{Character, CharacterInput};

#[derive(Clone, Default)]
pub struct CharacterStore {
    characters: Arc<DashMap<i64, Character>>,
    ids: Arc<IdGenerator>,
}

impl CharacterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All characters, ordered by id.
    pub fn list(&self) -> Vec<Character> {
        let mut all: Vec<Character> = self
            .characters
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub fn get(&self, id: i64) -> Option<Character> {
        self.characters.get(&id).map(|c| c.clone())
    }

    pub fn insert(&self, input: CharacterInput) -> Character {
        let character = input.into_character(self.ids.next_id());
        self.characters.insert(character.id, character.clone());
        character
    }

    /// Replaces an existing character. Returns `None` if the id is unknown.
    pub fn update(&self, id: i64, input: CharacterInput) -> Option<Character> {
        let mut slot = self.characters.get_mut(&id)?;
        *slot = input.into_character(id);
        Some(slot.clone())
    }

    pub fn delete(&self, id: i64) -> bool {
        self.characters.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str) -> CharacterInput {
        CharacterInput {
            name: name.into(),
            last_name: "Skywalker".into(),
        }
    }

    #[test]
    fn update_requires_existing_id() {
        let store = CharacterStore::new();
        assert!(store.update(42, input("Anakin")).is_none());

        let created = store.insert(input("Anakin"));
        let updated = store.update(created.id, input("Darth Vader")).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(store.get(created.id).unwrap().name, "Darth Vader");
    }

    #[test]
    fn list_is_ordered_and_delete_removes() {
        let store = CharacterStore::new();
        let first = store.insert(input("Anakin"));
        let second = store.insert(input("Leia Organa"));

        let ids: Vec<i64> = store.list().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        assert!(store.delete(first.id));
        assert!(!store.delete(first.id));
        assert_eq!(store.list().len(), 1);
    }
}
