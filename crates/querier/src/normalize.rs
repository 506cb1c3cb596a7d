/// HTTP-boundary parsing: field-name normalisation (`entryWord` <->
/// `entry_word`, `resourceId` <-> `resource_id`) and the sort-parameter
/// grammar. Kept out of `context`/`storage` per spec §9's own design note
/// that the camelCase translation is a legacy HTTP-layer concern, not a core
/// one.
use query::plan::SortDirection;

pub fn normalize_field(name: &str) -> String {
    match name {
        "entryWord" => "entry_word".to_string(),
        "resourceId" => "resource_id".to_string(),
        other => other.to_string(),
    }
}

pub fn csv_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(normalize_field).collect()
}

/// Parses the sort grammar:
/// `sort ::= order | field_sort ("," field_sort)*`
/// `field_sort ::= field_name "|" order | field_name`
/// A bare `asc`/`desc` yields a single `("_default", order)` entry.
pub fn parse_sort(raw: &str) -> Result<Vec<(String, SortDirection)>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw == "asc" || raw == "desc" {
        return Ok(vec![("_default".to_string(), parse_direction(raw)?)]);
    }
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            match part.split_once('|') {
                Some((field, dir)) => Ok((normalize_field(field), parse_direction(dir)?)),
                None => Ok((normalize_field(part), SortDirection::Asc)),
            }
        })
        .collect()
}

fn parse_direction(raw: &str) -> Result<SortDirection, String> {
    match raw {
        "asc" => Ok(SortDirection::Asc),
        "desc" => Ok(SortDirection::Desc),
        other => Err(format!("unknown sort order \"{}\"", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_order_applies_to_default() {
        assert_eq!(parse_sort("asc").unwrap(), vec![("_default".to_string(), SortDirection::Asc)]);
    }

    #[test]
    fn test_field_sort_list() {
        let parsed = parse_sort("entryWord|desc,freq").unwrap();
        assert_eq!(parsed, vec![("entry_word".to_string(), SortDirection::Desc), ("freq".to_string(), SortDirection::Asc)]);
    }

    #[test]
    fn test_csv_normalizes_field_names() {
        assert_eq!(csv_list("resourceId,entryWord, pos"), vec!["resource_id", "entry_word", "pos"]);
    }
}
