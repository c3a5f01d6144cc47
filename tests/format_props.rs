//! Property tests over generated comment-free JSON documents: reformatting
//! is idempotent, and minification preserves the parsed value.

use jsonfold::Formatter;
use proptest::prelude::*;
use serde_json::Value;

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|members| Value::Object(members.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn reformat_is_idempotent(value in arb_json()) {
        let text = value.to_string();
        let mut formatter = Formatter::new();
        let once = formatter.reformat(&text, 0).unwrap();
        let twice = formatter.reformat(&once, 0).unwrap();
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn minify_preserves_the_parsed_value(value in arb_json()) {
        let text = value.to_string();
        let mut formatter = Formatter::new();
        let pretty = formatter.reformat(&text, 0).unwrap();
        let minified = formatter.minify(&pretty).unwrap();
        let reparsed: Value = serde_json::from_str(&minified).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn narrow_budgets_never_break_reparsing(value in arb_json(), width in 8usize..60) {
        let text = value.to_string();
        let mut formatter = Formatter::new();
        formatter.options.max_total_line_length = width;
        let pretty = formatter.reformat(&text, 0).unwrap();
        let reparsed: Value = serde_json::from_str(&pretty).unwrap();
        prop_assert_eq!(reparsed, value);
    }
}
