use std::collections::HashSet;

use binding::{parse_selection, FragmentReplacement};
use tracing::debug;
use typedefs_feature::TypeDefs;

use crate::error::ResolverError;
use crate::map::{ResolverEntry, ResolverMap};
use crate::resolver::parent_field;

/// Overrides that make every field of every non-root object type also
/// fetch `selection`, e.g. `{ id }`.
///
/// Fields named at the top level of `selection` are skipped. Each override
/// resolves to `parent[field]`.
pub fn add_fragment(type_defs: &TypeDefs, selection: &str) -> Result<ResolverMap, ResolverError> {
    let selected: HashSet<String> = parse_selection(selection)
        .map_err(|message| ResolverError::InvalidSelection {
            selection: selection.to_string(),
            message,
        })?
        .into_iter()
        .map(|field| field.name)
        .collect();
    let selection = selection.trim();

    let roots = type_defs.roots();
    let mut overrides = ResolverMap::new();
    for ty in type_defs.object_types() {
        if [&roots.query, &roots.mutation, &roots.subscription].contains(&&ty.name) {
            continue;
        }
        let Some(fields) = ty.fields() else {
            continue;
        };
        for field in fields.keys().filter(|name| !selected.contains(*name)) {
            overrides.insert(
                &ty.name,
                field,
                ResolverEntry::with_fragment(
                    format!("fragment Fragment on {} {selection}", ty.name),
                    parent_field(field),
                ),
            );
        }
    }
    debug!(fields = overrides.len(), "Fragment overrides generated");
    Ok(overrides)
}

/// Flatten the fragments of a resolver map into the list the data-access
/// client uses to extend outgoing selections
pub fn extract_fragment_replacements(resolvers: &ResolverMap) -> Vec<FragmentReplacement> {
    resolvers
        .iter()
        .filter_map(|(type_name, field_name, entry)| {
            entry
                .fragment()
                .map(|fragment| FragmentReplacement::new(type_name, field_name, fragment))
        })
        .collect()
}

/// Resolvers and fragment replacements produced by [`always_query_id_field`]
#[derive(Debug, Clone)]
pub struct FragmentOverrides {
    pub resolvers: ResolverMap,
    pub fragments: Vec<FragmentReplacement>,
}

/// Make every datamodel field also fetch the type's `id`
pub fn always_query_id_field(datamodel: &str) -> Result<FragmentOverrides, ResolverError> {
    let type_defs = TypeDefs::parse(datamodel)?;
    let resolvers = add_fragment(&type_defs, "{ id }")?;
    let fragments = extract_fragment_replacements(&resolvers);
    Ok(FragmentOverrides {
        resolvers,
        fragments,
    })
}
