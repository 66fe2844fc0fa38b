use std::collections::HashMap;

pub fn cat_strings(values: &[String]) -> String {
    values.join(",")
}

pub fn cat_ecgis(ecgis: &[u64]) -> String {
    ecgis
        .iter()
        .map(|ecgi| ecgi.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Render labels as `k=v` pairs sorted by key.
pub fn cat_labels(labels: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = labels.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_strings_joins_with_commas() {
        assert_eq!(cat_strings(&["kpm".into(), "rc".into()]), "kpm,rc");
        assert_eq!(cat_strings(&[]), "");
    }

    #[test]
    fn cat_ecgis_joins_ids() {
        assert_eq!(cat_ecgis(&[21458294, 21458295]), "21458294,21458295");
        assert_eq!(cat_ecgis(&[]), "");
    }

    #[test]
    fn cat_labels_sorted() {
        let mut labels = HashMap::new();
        labels.insert("zone".to_string(), "east".to_string());
        labels.insert("role".to_string(), "leaf".to_string());
        assert_eq!(cat_labels(&labels), "role=leaf,zone=east");
    }
}
