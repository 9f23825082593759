use anyhow::{Context, Result, bail};
use serde_json::Value;

use crate::ir::InstanceSet;

/// Normalize a standard SPARQL JSON result (`head.vars` + `results.bindings`)
/// into the flat instance map the tree builder consumes. Rows are grouped by
/// the `primary` variable; the variables of the instance query shape
/// (`class`, `aclass`, `label`, `dataProperty`/`dpropertyValue`,
/// `objpout`/`objpoutval`, `objpin`/`objpinval`) accumulate into the grouped
/// record, paired columns staying aligned per row.
pub fn instance_result(raw: &Value, primary: &str) -> Result<InstanceSet> {
    let bindings = raw
        .pointer("/results/bindings")
        .and_then(Value::as_array)
        .context("result has no results.bindings array")?;

    let mut set = InstanceSet::new();
    for row in bindings {
        let Some(row) = row.as_object() else {
            bail!("binding row is not an object");
        };
        let Some(iri) = cell(row, primary) else {
            // Rows without the grouping variable carry nothing attributable.
            continue;
        };
        let iri = iri.to_string();
        let record = set.entry(&iri);

        if let Some(class) = cell(row, "class")
            && !record.classes.iter().any(|c| c == class)
        {
            record.classes.push(class.to_string());
        }
        if let Some(aclass) = cell(row, "aclass")
            && !record.aclass.iter().any(|c| c == aclass)
        {
            record.aclass.push(aclass.to_string());
        }
        if let Some(label) = cell(row, "label")
            && !record.labels.iter().any(|l| l == label)
        {
            record.labels.push(label.to_string());
        }
        if let (Some(prop), Some(value)) = (cell(row, "dataProperty"), cell(row, "dpropertyValue")) {
            push_pair(&mut record.data_props, prop, value);
        }
        if let (Some(prop), Some(target)) = (cell(row, "objpout"), cell(row, "objpoutval")) {
            push_pair(&mut record.out_edges, prop, target);
        }
        if let (Some(prop), Some(source)) = (cell(row, "objpin"), cell(row, "objpinval")) {
            push_pair(&mut record.in_edges, prop, source);
        }
    }

    if set.is_empty() {
        bail!("result has no rows bound to ?{primary}");
    }
    Ok(set)
}

fn cell<'a>(row: &'a serde_json::Map<String, Value>, var: &str) -> Option<&'a str> {
    row.get(var)?.get("value")?.as_str()
}

fn push_pair(pairs: &mut Vec<(String, String)>, a: &str, b: &str) {
    if !pairs.iter().any(|(x, y)| x == a && y == b) {
        pairs.push((a.to_string(), b.to_string()));
    }
}
