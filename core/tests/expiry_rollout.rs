use ncf_patch_core::{apply_all, find_anchors, AnchorPattern, Outcome, PatchPlan};
use pretty_assertions::assert_eq;

const PAGE: &str = r#"export default function NcfSettings() {
  const [ncfData, setNcfData] = useState({
    b01Start: '00000001',
    b01End: '00001000',
    b01Current: '00000001',
    b02Start: '00000001',
    b02End: '00001000',
    b02Current: '00000001',
    b14Start: '00000001',
    b14End: '00001000',
    b14Current: '00000001',
    b15Start: '00000001',
    b15End: '00001000',
    b15Current: '00000001'
  })

  return (
    <div className="bg-white rounded-lg p-6 shadow-lg">
      <h2 className="text-xl font-bold text-gray-800 mb-4">Monitor NCF</h2>
      <div className="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4">
        <span>{monitorData.total}</span>
      </div>
    </div>
  )
}
"#;

const PLAN: &str = r#"
variants:
  - { id: B01, color: green, required_field: b01ExpiryDate }
  - { id: B02, color: blue, required_field: b02ExpiryDate }
  - { id: B14, color: yellow, required_field: b14ExpiryDate }
  - { id: B15, color: red, required_field: b15ExpiryDate }
vars:
  expired: text-red-600
  soon: text-orange-600
  valid: text-green-600
documents:
  - path: app/settings/page.tsx
    operations:
      - label: expiry state
        kind: extend_record
        scope: per_variant
        anchor:
          pattern: 'const \[ncfData, setNcfData\] = useState\(\{(?P<body>.*?)'
          terminator: '})'
          group: body
        fields:
          - { after: "{{id_lower}}Current", field: "{{required_field}}", default: "''" }
      - label: expiry summary
        kind: insert
        binding: expiryDate
        anchor:
          pattern: '<h2 className="[^"]*">Monitor NCF</h2>\s*'
          terminator: '<div className="grid grid-cols-1 md:grid-cols-2 lg:grid-cols-4 gap-4">'
        repeat:
          template: "type === '{{id}}' ? 'bg-{{color}}-500' :"
          separator: "\n          "
        template: |2-

                <div className="expiry-summary">
                  {Object.entries(monitorData.status).map(([type, status]) => (
                    <span key={type} className={`${
                      {{repeat}}
                      'bg-gray-500'
                    } ${status.{{binding}} ? '{{valid}}' : ''}`}>{type}</span>
                  ))}
                </div>
"#;

fn run(text: &str) -> ncf_patch_core::Applied {
    let plan = PatchPlan::from_yaml(PLAN).unwrap();
    let ops = plan.operations(&plan.documents[0]);
    apply_all("app/settings/page.tsx", text, &ops)
}

#[test]
fn four_variants_get_one_field_each_and_one_summary() {
    let applied = run(PAGE);

    assert_eq!(applied.results.len(), 5);
    assert!(applied.results.iter().all(|r| r.outcome == Outcome::Applied));
    assert!(applied.results.iter().all(|r| r.match_count == 1));

    for id in ["b01", "b02", "b14", "b15"] {
        let decl = format!("    {}Current: '00000001',\n    {}ExpiryDate: ''", id, id);
        assert!(applied.text.contains(&decl), "missing declaration for {}", id);
        assert_eq!(applied.text.matches(&format!("{}ExpiryDate", id)).count(), 1);
    }
    assert_eq!(applied.text.matches("expiry-summary").count(), 1);
    assert!(applied.text.contains("type === 'B14' ? 'bg-yellow-500' :"));
    assert!(applied.text.contains("status.expiryDate ? 'text-green-600'"));
}

#[test]
fn content_outside_insertion_points_is_untouched() {
    let applied = run(PAGE);

    let mut restored = applied.text.clone();
    for id in ["b01", "b02", "b14"] {
        restored = restored.replace(&format!("\n    {}ExpiryDate: '',", id), "");
    }
    restored = restored.replace(",\n    b15ExpiryDate: ''", "");

    let start = restored.find("\n      <div className=\"expiry-summary\">").unwrap();
    let end = restored[start..].find("</div>").unwrap() + start + "</div>".len();
    restored.replace_range(start..end, "");

    assert_eq!(restored, PAGE);
}

#[test]
fn applying_twice_equals_applying_once() {
    let once = run(PAGE);
    let twice = run(&once.text);
    assert_eq!(twice.text, once.text);
    assert!(!twice.changed());
    assert!(twice
        .results
        .iter()
        .all(|r| r.outcome == Outcome::AlreadyApplied && !r.applied));
}

#[test]
fn missing_anchor_does_not_block_the_rest() {
    let without_monitor = PAGE.replace("Monitor NCF", "Resumen");
    let applied = run(&without_monitor);
    let outcomes: Vec<_> = applied.results.iter().map(|r| &r.outcome).collect();
    assert_eq!(outcomes[4], &Outcome::AnchorNotFound);
    assert_eq!(applied.results[4].match_count, 0);
    assert!(applied.results[..4].iter().all(|r| r.applied));
    assert!(applied.text.contains("b15ExpiryDate: ''"));
}

#[test]
fn no_anchor_means_empty_sequence() {
    let anchor = AnchorPattern::bounded("absent", r"<Nothing\s+", "/>").unwrap();
    assert!(find_anchors(PAGE, &anchor).is_empty());
}
