use crate::models::ResearchResponse;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Completed research results, looked up by id.
pub trait ResultStore: Send + Sync {
    fn insert(&self, response: ResearchResponse);
    fn get(&self, id: &str) -> Option<ResearchResponse>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store that evicts the oldest entry once `capacity` is reached.
pub struct InMemoryResultStore {
    entries: DashMap<String, ResearchResponse>,
    order: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl InMemoryResultStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

impl ResultStore for InMemoryResultStore {
    fn insert(&self, response: ResearchResponse) {
        let id = response.id.clone();
        let mut order = self.order.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.entries.insert(id.clone(), response).is_none() {
            order.push_back(id);
        }
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn get(&self, id: &str) -> Option<ResearchResponse> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(id: &str) -> ResearchResponse {
        ResearchResponse {
            id: id.to_string(),
            query: "q".to_string(),
            tools: vec![],
            recommendations: String::new(),
            timestamp: String::new(),
            stage_times_ms: HashMap::new(),
        }
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let store = InMemoryResultStore::new(2);
        store.insert(response("a"));
        store.insert(response("b"));
        store.insert(response("c"));

        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_none());
        assert_eq!(store.get("c").unwrap().id, "c");
    }

    #[test]
    fn reinserting_an_id_does_not_double_count() {
        let store = InMemoryResultStore::new(2);
        store.insert(response("a"));
        store.insert(response("a"));
        store.insert(response("b"));

        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_some());
    }
}
