use super::error::{PdfError, PdfResult};
use super::registry::ObjectRegistry;
use super::value::PdfObject;

/// Attributes inheritable down a `/Parent` chain.
const INHERITABLE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// One flattened leaf: the page's own object number and its dictionary with
/// inherited attributes merged in (the page's own entry wins on conflict).
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub number: u32,
    pub dict: PdfObject,
}

/// Walks the page tree rooted at the catalog's `/Pages` entry and returns
/// its leaves (`/Type /Page` nodes) in document order.
/// strict `Type ∈ {Pages, Page}` validation (unknown or missing `Type` is a
/// hard error), no cycle detection.
pub fn flatten_page_tree(registry: &ObjectRegistry, catalog: &PdfObject) -> PdfResult<Vec<PageRecord>> {
    let pages_ref = catalog
        .get("Pages")
        .ok_or_else(|| PdfError::page_tree("catalog is missing /Pages"))?;
    let (pages_num, pages_dict) = resolve(registry, pages_ref)?;

    let mut out = Vec::with_capacity(32);
    visit(registry, pages_num, pages_dict, &Inherited::default(), &mut out)?;
    Ok(out)
}

#[derive(Default, Clone)]
struct Inherited {
    values: Vec<(&'static str, PdfObject)>,
}

impl Inherited {
    fn merged_with(&self, dict: &std::collections::HashMap<String, PdfObject>) -> Self {
        let mut values = self.values.clone();
        for key in INHERITABLE_KEYS {
            if let Some(v) = dict.get(key) {
                values.retain(|(k, _)| *k != key);
                values.push((key, v.clone()));
            }
        }
        Inherited { values }
    }

    fn apply_to(&self, dict: &mut std::collections::HashMap<String, PdfObject>) {
        for (key, value) in &self.values {
            dict.entry(key.to_string()).or_insert_with(|| value.clone());
        }
    }
}

fn visit(
    registry: &ObjectRegistry,
    number: u32,
    dict: &PdfObject,
    inherited: &Inherited,
    out: &mut Vec<PageRecord>,
) -> PdfResult<()> {
    let fields = dict
        .as_dict()
        .ok_or_else(|| PdfError::page_tree(format!("object {number} has no dictionary")))?;

    match fields.get("Type").and_then(|t| t.as_name()) {
        Some("Pages") => {
            let next_inherited = inherited.merged_with(fields);
            let kids = fields
                .get("Kids")
                .and_then(|k| k.as_array())
                .ok_or_else(|| PdfError::page_tree(format!("Pages node {number} is missing /Kids")))?;

            if out.len() + kids.len() > out.capacity() {
                out.reserve(32);
            }

            for kid in kids {
                let (kid_num, kid_dict) = resolve(registry, kid)?;
                visit(registry, kid_num, kid_dict, &next_inherited, out)?;
            }
            Ok(())
        }
        Some("Page") => {
            let mut merged = fields.clone();
            inherited.apply_to(&mut merged);
            out.push(PageRecord {
                number,
                dict: PdfObject::Dict(merged),
            });
            Ok(())
        }
        Some(other) => Err(PdfError::page_tree(format!(
            "object {number} has unexpected /Type /{other} in page tree"
        ))),
        None => Err(PdfError::page_tree(format!(
            "object {number} is missing /Type in page tree"
        ))),
    }
}

/// Resolves `obj` to its object number (0 if it was not itself a
/// reference, e.g. the catalog's inline `/Pages` dict) and dictionary
/// value, following exactly one level of indirection through `registry`.
fn resolve<'a>(registry: &'a ObjectRegistry, obj: &'a PdfObject) -> PdfResult<(u32, &'a PdfObject)> {
    match obj.as_ref() {
        Some((number, _generation)) => {
            let record = registry
                .find(number)
                .ok_or_else(|| PdfError::page_tree(format!("unresolved reference to object {number}")))?;
            Ok((number, &record.value))
        }
        None => Ok((0, obj)),
    }
}
