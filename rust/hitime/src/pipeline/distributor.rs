use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

/// Hands out spectrum indices `0..len`, each exactly once, to whichever
/// worker asks first.
#[derive(Debug)]
pub struct WorkDistributor {
    next: AtomicUsize,
    len: usize,
}

impl WorkDistributor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Next unclaimed index, or `None` once all have been handed out.
    pub fn next(&self) -> Option<usize> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        if index < self.len {
            Some(index)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_sequential_exhaustion() {
        let dist = WorkDistributor::new(3);
        assert_eq!(dist.next(), Some(0));
        assert_eq!(dist.next(), Some(1));
        assert_eq!(dist.next(), Some(2));
        assert_eq!(dist.next(), None);
        assert_eq!(dist.next(), None);
        assert!(WorkDistributor::new(0).next().is_none());
    }

    #[test]
    fn test_concurrent_claims_are_unique() {
        let dist = WorkDistributor::new(1000);
        let seen = Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let mut local = Vec::new();
                    while let Some(i) = dist.next() {
                        local.push(i);
                    }
                    seen.lock().unwrap().extend(local);
                });
            }
        });
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1000);
        let unique: HashSet<_> = seen.into_iter().collect();
        assert_eq!(unique.len(), 1000);
        assert!(unique.iter().all(|&i| i < 1000));
    }
}
