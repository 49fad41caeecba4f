//! Built-in collectors for the common result shapes.

use super::collector::Collector;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::hash::Hash;

/// Collect into a vector, preserving encounter order.
pub fn to_vec<T: Send + 'static>() -> Collector<T, Vec<T>, Vec<T>> {
    Collector::of(
        Vec::new,
        |mut v, item| {
            v.push(item);
            v
        },
        |mut a, mut b| {
            a.append(&mut b);
            a
        },
        |v| v,
    )
}

/// Collect into a hash set, dropping duplicates.
pub fn to_set<T>() -> Collector<T, HashSet<T>, HashSet<T>>
where
    T: Hash + Eq + Send + 'static,
{
    Collector::of(
        HashSet::new,
        |mut set, item| {
            set.insert(item);
            set
        },
        |mut a, b| {
            a.extend(b);
            a
        },
        |set| set,
    )
}

/// Collect into a map keyed and valued by the given projections. A later
/// element with an existing key replaces the earlier entry.
pub fn to_map<T, K, V>(
    key_fn: impl Fn(&T) -> K + Send + Sync + 'static,
    value_fn: impl Fn(T) -> V + Send + Sync + 'static,
) -> Collector<T, HashMap<K, V>, HashMap<K, V>>
where
    T: Send + 'static,
    K: Hash + Eq + Send + 'static,
    V: Send + 'static,
{
    Collector::of(
        HashMap::new,
        move |mut map, item| {
            map.insert(key_fn(&item), value_fn(item));
            map
        },
        |mut a, b| {
            a.extend(b);
            a
        },
        |map| map,
    )
}

/// Count surviving elements.
pub fn counting<T: Send + 'static>() -> Collector<T, usize, usize> {
    Collector::of(|| 0, |n, _| n + 1, |a, b| a + b, |n| n)
}

/// Join element representations into one string with a separator, wrapped in
/// a prefix and suffix.
pub fn joining<T>(separator: &str, prefix: &str, suffix: &str) -> Collector<T, Option<String>, String>
where
    T: Display + Send + 'static,
{
    let separator = separator.to_string();
    let sep_combine = separator.clone();
    let prefix = prefix.to_string();
    let suffix = suffix.to_string();

    Collector::of(
        || None,
        move |acc: Option<String>, item: T| match acc {
            None => Some(item.to_string()),
            Some(mut s) => {
                s.push_str(&separator);
                s.push_str(&item.to_string());
                Some(s)
            }
        },
        move |a, b| match (a, b) {
            (Some(mut a), Some(b)) => {
                a.push_str(&sep_combine);
                a.push_str(&b);
                Some(a)
            }
            (Some(a), None) => Some(a),
            (None, b) => b,
        },
        move |acc| {
            let mut out = prefix.clone();
            out.push_str(&acc.unwrap_or_default());
            out.push_str(&suffix);
            out
        },
    )
}

/// Group elements by a key, preserving encounter order within each group.
pub fn grouping_by<T, K>(
    key_fn: impl Fn(&T) -> K + Send + Sync + 'static,
) -> Collector<T, HashMap<K, Vec<T>>, HashMap<K, Vec<T>>>
where
    T: Send + 'static,
    K: Hash + Eq + Send + 'static,
{
    Collector::of(
        HashMap::new,
        move |mut map: HashMap<K, Vec<T>>, item| {
            map.entry(key_fn(&item)).or_default().push(item);
            map
        },
        |mut a: HashMap<K, Vec<T>>, b| {
            for (key, mut group) in b {
                a.entry(key).or_default().append(&mut group);
            }
            a
        },
        |map| map,
    )
}

/// Count/sum/min/max/mean over an integer projection of the elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryStats {
    count: u64,
    sum: i64,
    min: Option<i64>,
    max: Option<i64>,
}

impl SummaryStats {
    fn add(mut self, value: i64) -> Self {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.count += other.count;
        self.sum += other.sum;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Summarize an integer projection of the elements.
pub fn summarizing_i64<T>(
    f: impl Fn(&T) -> i64 + Send + Sync + 'static,
) -> Collector<T, SummaryStats, SummaryStats>
where
    T: Send + 'static,
{
    Collector::of(
        SummaryStats::default,
        move |stats, item| stats.add(f(&item)),
        SummaryStats::merge,
        |stats| stats,
    )
}
