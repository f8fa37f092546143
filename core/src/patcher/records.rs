use crate::anchor::locate;
use crate::error::{AppError, AppResult};
use crate::patcher::common::{Operation, Step};
use crate::schema::{FieldAddition, RecordLiteral};
use crate::template::Template;

/// Adds fields to every record literal captured by the operation's anchor.
///
/// The anchor's group (or whole match) must cover the literal body, i.e. the text
/// between its braces.
pub(crate) fn extend_record(text: &str, op: &Operation, fields: &[FieldAddition]) -> AppResult<Step> {
    let anchor = op.anchor.compile(&op.label, &op.bindings)?;
    let matches = locate(text, &anchor)?;
    if matches.is_empty() {
        return Ok(Step::missing());
    }

    let additions = fields
        .iter()
        .map(|f| -> AppResult<FieldAddition> {
            Ok(FieldAddition::new(
                Template::parse(f.after.as_str()).render(&op.bindings)?,
                Template::parse(f.field.as_str()).render(&op.bindings)?,
                Template::parse(f.default.as_str()).render(&op.bindings)?,
            ))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let mut out = text.to_string();
    let mut changed = 0;

    for m in matches.iter().rev() {
        let (start, end) = m.span(op.anchor.group.as_deref())?;
        let ext = match RecordLiteral::extend(&out[start..end], &additions) {
            Ok(ext) => ext,
            Err(AppError::AnchorNotFound { anchor }) => {
                log::debug!("{}: {} missing from record", op.label, anchor);
                return Ok(Step::missing_in(matches.len()));
            }
            Err(e) => return Err(e),
        };
        if !ext.skipped.is_empty() {
            log::debug!("{}: already declared {:?}", op.label, ext.skipped);
        }
        if ext.inserted.is_empty() {
            continue;
        }
        out.replace_range(start..end, &ext.text);
        changed += 1;
    }

    Ok(Step::finish(out, changed, matches.len()))
}
