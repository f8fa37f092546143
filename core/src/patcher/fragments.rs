use crate::anchor::locate;
use crate::error::AppResult;
use crate::patcher::common::{Operation, Position, Repeat, Step};
use crate::template::{Bindings, Template};

/// Splices the operation's fragment next to every occurrence of its anchor.
///
/// Occurrences already followed (or preceded, for `Before`) by the fragment,
/// ignoring surrounding whitespace, are left alone.
pub(crate) fn insert_fragment(
    text: &str,
    op: &Operation,
    position: Position,
    template: &str,
    repeat: Option<&Repeat>,
) -> AppResult<Step> {
    let anchor = op.anchor.compile(&op.label, &op.bindings)?;
    let matches = locate(text, &anchor)?;
    if matches.is_empty() {
        return Ok(Step::missing());
    }

    let fragment = render_fragment(op, template, repeat)?;
    let needle = fragment.trim();

    let mut out = text.to_string();
    let mut inserted = 0;

    // Back to front so earlier offsets stay valid.
    for m in matches.iter().rev() {
        let (start, end) = m.span(op.anchor.group.as_deref())?;
        let point = match position {
            Position::Before => start,
            Position::After => end,
        };

        let present = match position {
            Position::After => out[point..].trim_start().starts_with(needle),
            Position::Before => out[..point].trim_end().ends_with(needle),
        };
        if present {
            log::debug!("{}: fragment already present at byte {}", op.label, point);
            continue;
        }

        out.insert_str(point, &fragment);
        inserted += 1;
    }

    Ok(Step::finish(out, inserted, matches.len()))
}

fn render_fragment(op: &Operation, template: &str, repeat: Option<&Repeat>) -> AppResult<String> {
    let mut bindings = op.bindings.clone();

    if let Some(repeat) = repeat {
        let item = Template::parse(repeat.template.as_str());
        let binding = op.bindings.get("binding").unwrap_or_default();
        let items = op
            .variants
            .iter()
            .map(|v| item.render(&Bindings::for_variant(v, binding).with_defaults(op.bindings.values())))
            .collect::<AppResult<Vec<_>>>()?;
        bindings.insert("repeat", items.join(&repeat.separator));
    }

    Template::fragment(template)?.render_fragment(&bindings)
}
