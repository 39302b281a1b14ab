//! Mutable runtime state owned by the execution engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ss_program::Value;

use crate::character::Character;
use crate::error::RuntimeError;

/// The current scene backdrop: one background name and one time-of-day
/// value, each overwritten in place. No history is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneState {
    /// Current background name.
    pub background: String,
    /// Current time-of-day text.
    pub time_of_day: String,
}

/// All mutable state of a running story.
///
/// Mutated only by the engine in response to instruction execution; hosts
/// get read access through [`crate::Engine::state`] for display. Restart
/// clears everything while the loaded program is reused unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateStore {
    variables: HashMap<String, Value>,
    inventories: HashMap<String, Vec<String>>,
    characters: HashMap<String, Character>,
    scene: SceneState,
}

impl StateStore {
    /// Create an empty state store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all state: variables, inventories, characters, and scene.
    pub fn reset(&mut self) {
        self.variables.clear();
        self.inventories.clear();
        self.characters.clear();
        self.scene = SceneState::default();
    }

    // -- Variables ---------------------------------------------------------

    /// Read a variable. Reading an unset name is an error; there is no
    /// implicit default.
    pub fn var(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.variables
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))
    }

    /// Create or overwrite a variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// All variable bindings.
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    // -- Inventories -------------------------------------------------------

    /// Create a named, empty inventory. Re-creating an existing inventory
    /// empties it.
    pub fn create_inventory(&mut self, name: impl Into<String>) {
        self.inventories.insert(name.into(), Vec::new());
    }

    /// Read an inventory's items in insertion order.
    pub fn inventory(&self, name: &str) -> Result<&[String], RuntimeError> {
        self.inventories
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| RuntimeError::UnknownInventory(name.to_string()))
    }

    /// Append an item; duplicates are allowed.
    pub fn add_item(&mut self, inventory: &str, item: impl Into<String>) -> Result<(), RuntimeError> {
        self.inventories
            .get_mut(inventory)
            .ok_or_else(|| RuntimeError::UnknownInventory(inventory.to_string()))?
            .push(item.into());
        Ok(())
    }

    /// Remove the first occurrence of an item.
    pub fn remove_item(&mut self, inventory: &str, item: &str) -> Result<(), RuntimeError> {
        let items = self
            .inventories
            .get_mut(inventory)
            .ok_or_else(|| RuntimeError::UnknownInventory(inventory.to_string()))?;
        match items.iter().position(|held| held == item) {
            Some(index) => {
                items.remove(index);
                Ok(())
            }
            None => Err(RuntimeError::ItemNotFound {
                inventory: inventory.to_string(),
                item: item.to_string(),
            }),
        }
    }

    /// Remove every item from an inventory.
    pub fn clear_inventory(&mut self, inventory: &str) -> Result<(), RuntimeError> {
        self.inventories
            .get_mut(inventory)
            .ok_or_else(|| RuntimeError::UnknownInventory(inventory.to_string()))?
            .clear();
        Ok(())
    }

    /// All inventories.
    pub fn inventories(&self) -> &HashMap<String, Vec<String>> {
        &self.inventories
    }

    // -- Characters --------------------------------------------------------

    /// Register a character with blank fields. Re-adding resets the record.
    pub fn add_character(&mut self, name: impl Into<String>) {
        self.characters.insert(name.into(), Character::default());
    }

    /// Remove a character from the registry.
    pub fn remove_character(&mut self, name: &str) -> Result<(), RuntimeError> {
        self.characters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RuntimeError::UnknownCharacter(name.to_string()))
    }

    /// Read a character record.
    pub fn character(&self, name: &str) -> Result<&Character, RuntimeError> {
        self.characters
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownCharacter(name.to_string()))
    }

    /// Mutate a character record.
    pub fn character_mut(&mut self, name: &str) -> Result<&mut Character, RuntimeError> {
        self.characters
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UnknownCharacter(name.to_string()))
    }

    /// Move a character's record to a new name, removing the old key.
    pub fn rename_character(&mut self, from: &str, to: impl Into<String>) -> Result<(), RuntimeError> {
        let record = self
            .characters
            .remove(from)
            .ok_or_else(|| RuntimeError::UnknownCharacter(from.to_string()))?;
        self.characters.insert(to.into(), record);
        Ok(())
    }

    /// All registered characters.
    pub fn characters(&self) -> &HashMap<String, Character> {
        &self.characters
    }

    // -- Scene -------------------------------------------------------------

    /// The current scene state.
    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// Overwrite the current background.
    pub fn set_background(&mut self, name: impl Into<String>) {
        self.scene.background = name.into();
    }

    /// Overwrite the current time of day.
    pub fn set_time_of_day(&mut self, value: impl Into<String>) {
        self.scene.time_of_day = value.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_is_an_error() {
        let state = StateStore::new();
        assert_eq!(
            state.var("gold"),
            Err(RuntimeError::UndefinedVariable("gold".into()))
        );
    }

    #[test]
    fn set_and_read_variable() {
        let mut state = StateStore::new();
        state.set_var("gold", Value::Int(10));
        assert_eq!(state.var("gold"), Ok(&Value::Int(10)));

        state.set_var("gold", Value::Int(12));
        assert_eq!(state.var("gold"), Ok(&Value::Int(12)));
    }

    #[test]
    fn inventory_requires_creation() {
        let mut state = StateStore::new();
        assert_eq!(
            state.add_item("bag", "key"),
            Err(RuntimeError::UnknownInventory("bag".into()))
        );

        state.create_inventory("bag");
        state.add_item("bag", "key").unwrap();
        assert_eq!(state.inventory("bag").unwrap(), ["key"]);
    }

    #[test]
    fn inventory_keeps_duplicates_in_order() {
        let mut state = StateStore::new();
        state.create_inventory("bag");
        state.add_item("bag", "coin").unwrap();
        state.add_item("bag", "key").unwrap();
        state.add_item("bag", "coin").unwrap();
        assert_eq!(state.inventory("bag").unwrap(), ["coin", "key", "coin"]);

        // Removal takes the first occurrence only.
        state.remove_item("bag", "coin").unwrap();
        assert_eq!(state.inventory("bag").unwrap(), ["key", "coin"]);
    }

    #[test]
    fn remove_missing_item() {
        let mut state = StateStore::new();
        state.create_inventory("bag");
        assert_eq!(
            state.remove_item("bag", "gem"),
            Err(RuntimeError::ItemNotFound {
                inventory: "bag".into(),
                item: "gem".into()
            })
        );
    }

    #[test]
    fn character_lifecycle() {
        let mut state = StateStore::new();
        state.add_character("Mira");
        state.character_mut("Mira").unwrap().emotion = "curious".into();

        state.rename_character("Mira", "Mira the Bold").unwrap();
        assert!(state.character("Mira").is_err());
        assert_eq!(state.character("Mira the Bold").unwrap().emotion, "curious");
    }

    #[test]
    fn missing_character_is_an_error() {
        let mut state = StateStore::new();
        assert_eq!(
            state.remove_character("Nobody"),
            Err(RuntimeError::UnknownCharacter("Nobody".into()))
        );
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = StateStore::new();
        state.set_var("x", Value::Int(1));
        state.create_inventory("bag");
        state.add_character("Mira");
        state.set_background("forest");
        state.set_time_of_day("dusk");

        state.reset();

        assert!(state.variables().is_empty());
        assert!(state.inventories().is_empty());
        assert!(state.characters().is_empty());
        assert_eq!(state.scene(), &SceneState::default());
    }
}
