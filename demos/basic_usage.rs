use oniguruma_parser::core::optimizer::{optimize, OptimizerOptions};
use oniguruma_parser::core::parser::{parse, ParserOptions};
use oniguruma_parser::generator::generate;

fn show(label: &str, source: &str) {
    println!("{label}");
    println!("  Input:  '{source}'");
    let ast = parse(source, ParserOptions::default()).unwrap();
    let generated = generate(&ast).unwrap();
    println!("  Parsed + regenerated: '{}'", generated.pattern);

    let optimized = optimize(source, OptimizerOptions::default()).unwrap();
    println!("  Optimized: '{}'\n", optimized.pattern);
}

fn main() {
    println!("=== oniguruma-parser demo ===\n");

    show("Test 1: Simple literal", "hello");
    show("Test 2: Anchors and quantifier", "^test.*$");
    show("Test 3: Alternation", "cat|dog|bird");
    show("Test 4: Capturing group with quantifier", "(ab)+");
    show("Test 5: Named group", "(?<word>\\w+)");
    show("Test 6: Positive lookahead", "test(?=123)");
    show("Test 7: Unicode property to shorthand", "\\p{Decimal_Number}+");
    show("Test 8: Full hex-digit split to shorthand", "[0-9A-Fa-f]");
}
