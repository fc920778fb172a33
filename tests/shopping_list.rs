use foodgram::{
    dto::cart::{CartLine, ShoppingListEntry},
    services::shopping_list::{aggregate, format_entry},
};

fn cart_line(name: &str, unit: &str, amount: i32) -> CartLine {
    CartLine {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        amount,
    }
}

#[test]
fn lines_with_the_same_name_are_summed() {
    let entries = aggregate(vec![
        cart_line("sugar", "g", 100),
        cart_line("egg", "pcs", 2),
        cart_line("sugar", "g", 50),
    ]);

    assert_eq!(
        entries,
        vec![
            ShoppingListEntry {
                name: "egg".into(),
                measurement_unit: "pcs".into(),
                amount: 2,
            },
            ShoppingListEntry {
                name: "sugar".into(),
                measurement_unit: "g".into(),
                amount: 150,
            },
        ]
    );
}

#[test]
fn first_unit_seen_wins() {
    let entries = aggregate(vec![cart_line("milk", "ml", 200), cart_line("milk", "cup", 1)]);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].measurement_unit, "ml");
    assert_eq!(entries[0].amount, 201);
}

#[test]
fn large_amounts_do_not_overflow() {
    let entries = aggregate(vec![
        cart_line("flour", "g", i32::MAX),
        cart_line("flour", "g", i32::MAX),
    ]);
    assert_eq!(entries[0].amount, 2 * i64::from(i32::MAX));
}

#[test]
fn empty_input_yields_empty_list() {
    assert!(aggregate(Vec::new()).is_empty());
}

#[test]
fn entry_is_formatted_as_name_amount_unit() {
    let entry = ShoppingListEntry {
        name: "flour".into(),
        measurement_unit: "g".into(),
        amount: 500,
    };
    assert_eq!(format_entry(&entry), "flour - 500 g");
}
