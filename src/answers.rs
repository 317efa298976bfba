use crate::models::{Answer, AnswerValue};
use std::collections::HashMap;

/// Latest answer per question. Later writes replace earlier ones.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    answers: HashMap<String, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question_id: &str, value: AnswerValue) {
        self.answers
            .insert(question_id.to_string(), Answer::new(question_id, value));
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.answers.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Iteration order is unspecified; the server keys answers by question id.
    pub fn to_answer_list(&self) -> Vec<Answer> {
        self.answers.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_write_wins() {
        let mut store = AnswerStore::new();
        store.set("q1", AnswerValue::Choice(0));
        store.set("q1", AnswerValue::Choice(3));
        store.set("q1", AnswerValue::Choice(1));
        store.set("q2", AnswerValue::Text("lifetimes".into()));

        let list = store.to_answer_list();
        assert_eq!(list.len(), 2);
        let q1 = list.iter().find(|a| a.question_id == "q1").unwrap();
        assert_eq!(q1.selected_answer_index, Some(1));
        assert_eq!(store.get("q2").unwrap().selected_answer_text.as_deref(), Some("lifetimes"));
    }

    #[test]
    fn switching_kind_replaces_previous_fields() {
        let mut store = AnswerStore::new();
        store.set("q1", AnswerValue::Choice(2));
        store.set("q1", AnswerValue::Text("free".into()));
        let answer = store.get("q1").unwrap();
        assert_eq!(answer.selected_answer_index, None);
        assert_eq!(answer.selected_answer_text.as_deref(), Some("free"));
    }

    #[test]
    fn empty_store() {
        let mut store = AnswerStore::new();
        assert!(store.is_empty());
        assert!(store.get("missing").is_none());
        store.set("q1", AnswerValue::TrueFalse(true));
        assert!(store.is_answered("q1"));
        store.clear();
        assert!(store.to_answer_list().is_empty());
    }
}
