use indexmap::IndexMap;

use crate::resolver::{Resolver, SubscriptionResolver};

/// What a resolver map holds for one field
#[derive(Clone)]
pub enum ResolverEntry {
    /// A field resolver, optionally asking the data-access client to fetch
    /// `fragment` alongside the field
    Resolve {
        fragment: Option<String>,
        resolve: Resolver,
    },
    /// A subscription root field
    Subscribe(SubscriptionResolver),
}

impl ResolverEntry {
    pub fn resolve(resolve: Resolver) -> Self {
        ResolverEntry::Resolve {
            fragment: None,
            resolve,
        }
    }

    pub fn with_fragment(fragment: impl Into<String>, resolve: Resolver) -> Self {
        ResolverEntry::Resolve {
            fragment: Some(fragment.into()),
            resolve,
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        match self {
            ResolverEntry::Resolve { fragment, .. } => fragment.as_deref(),
            ResolverEntry::Subscribe(_) => None,
        }
    }
}

impl std::fmt::Debug for ResolverEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverEntry::Resolve { fragment, .. } => f
                .debug_struct("Resolve")
                .field("fragment", fragment)
                .finish_non_exhaustive(),
            ResolverEntry::Subscribe(_) => f.write_str("Subscribe"),
        }
    }
}

/// Type name → field name → resolver entry
#[derive(Debug, Clone, Default)]
pub struct ResolverMap {
    types: IndexMap<String, IndexMap<String, ResolverEntry>>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        entry: ResolverEntry,
    ) -> Option<ResolverEntry> {
        self.types
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), entry)
    }

    /// Builder form of [`ResolverMap::insert`] for a plain resolver
    pub fn with_resolver(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolve: Resolver,
    ) -> Self {
        self.insert(type_name, field_name, ResolverEntry::resolve(resolve));
        self
    }

    /// Builder form of [`ResolverMap::insert`] for a subscription
    pub fn with_subscription(
        mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        subscribe: SubscriptionResolver,
    ) -> Self {
        self.insert(type_name, field_name, ResolverEntry::Subscribe(subscribe));
        self
    }

    /// Map holding `fields` under `type_name`
    pub fn from_fields<I>(type_name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, ResolverEntry)>,
    {
        let mut map = Self::new();
        let type_name = type_name.into();
        for (field, entry) in fields {
            map.insert(type_name.clone(), field, entry);
        }
        map
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&ResolverEntry> {
        self.types.get(type_name)?.get(field_name)
    }

    /// Entries of one type, in insertion order
    pub fn fields(&self, type_name: &str) -> Option<&IndexMap<String, ResolverEntry>> {
        self.types.get(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Every `(type, field, entry)` triple
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &ResolverEntry)> {
        self.types.iter().flat_map(|(type_name, fields)| {
            fields
                .iter()
                .map(move |(field, entry)| (type_name.as_str(), field.as_str(), entry))
        })
    }

    /// Number of field entries
    pub fn len(&self) -> usize {
        self.types.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Merge `other` over this map; on the same type and field `other` wins
    pub fn merge(&mut self, other: ResolverMap) {
        for (type_name, fields) in other.types {
            self.types.entry(type_name).or_default().extend(fields);
        }
    }

    /// Merge maps in order, later maps winning per field
    pub fn merge_all<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = ResolverMap>,
    {
        maps.into_iter().fold(Self::new(), |mut merged, map| {
            merged.merge(map);
            merged
        })
    }
}
