use std::sync::Arc;

use seq_automata::{
    matcher::Config, CompiledPattern, ElementPredicate, Expr, Extraction,
    Span,
};

use crate::{
    util::{chars, find_spans, words},
    Result,
};

#[test]
fn the_cat() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::literal("the"),
        Expr::group(Expr::any()),
    ]))?;
    let seq = words("the cat");
    let mut m = pattern.matcher(&seq);

    assert!(m.find());
    assert_eq!(0..2, m.group(0).unwrap());
    assert_eq!(1..2, m.group(1).unwrap());
    assert_eq!(Some(&["cat"][..]), m.group_nodes(1));
    assert_eq!(1, m.group_count());
    assert!(!m.find());
    Ok(())
}

#[test]
fn the_cat_sat_on_the_mat() -> Result {
    // (the)(cat|dog)
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::literal("the")),
        Expr::group(Expr::or(vec![
            Expr::literal("cat"),
            Expr::literal("dog"),
        ])),
    ]))?;
    let seq = words("the cat sat on the mat");
    let mut m = pattern.matcher(&seq);

    assert!(m.find());
    assert_eq!(0..2, m.group(0).unwrap());
    assert_eq!(0..1, m.group(1).unwrap());
    assert_eq!(1..2, m.group(2).unwrap());
    assert!(!m.find());

    m.region(2, 6)?;
    assert!(!m.find());
    assert_eq!(None, m.group(0));
    Ok(())
}

#[test]
fn successive_finds_do_not_overlap() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::literal("the"),
        Expr::group(Expr::any()),
    ]))?;
    let seq = words("the the cat saw the mat");
    let spans = find_spans(&pattern, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 2), Span::new(4, 6)], spans);
    Ok(())
}

#[test]
fn region_limits_the_search() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::literal("the"),
        Expr::any(),
    ]))?;
    let seq = words("the cat saw the dog");
    let mut m = pattern.matcher(&seq);

    m.region(2, 5)?;
    assert_eq!(2, m.region_start());
    assert_eq!(5, m.region_end());
    assert!(m.find());
    assert_eq!(Some(&["the", "dog"][..]), m.group_nodes(0));
    assert!(!m.find());

    // A match may not run past the end of the region.
    m.region(2, 4)?;
    assert!(!m.find());

    m.reset();
    assert_eq!(5, m.region_end());
    assert!(m.find());
    assert_eq!(0..2, m.group(0).unwrap());
    Ok(())
}

#[test]
fn greedy_and_lazy_repetition() -> Result {
    let seq = chars("aaxaax");
    let build = |greedy: bool| {
        CompiledPattern::new(Expr::sequence(vec![
            Expr::group(Expr::unbounded(Expr::any(), 0, greedy)),
            Expr::literal('x'),
        ]))
    };

    let mut greedy = build(true)?.matcher(&seq);
    assert!(greedy.find());
    assert_eq!(0..6, greedy.group(0).unwrap());
    assert_eq!(0..5, greedy.group(1).unwrap());

    let lazy = build(false)?;
    let spans = find_spans(&lazy, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 3), Span::new(3, 6)], spans);
    Ok(())
}

#[test]
fn bounded_repetition() -> Result {
    let pattern = CompiledPattern::new(Expr::repeat(
        Expr::literal('a'),
        2,
        Some(3),
        true,
    )?)?;
    let seq = chars("aaaaaaba");
    let spans = find_spans(&pattern, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 3), Span::new(3, 6)], spans);
    Ok(())
}

#[test]
fn earlier_alternatives_win() -> Result {
    let seq = chars("ab");
    let alternation = || {
        Expr::or(vec![
            Expr::literal('a'),
            Expr::sequence(vec![Expr::literal('a'), Expr::literal('b')]),
        ])
    };

    let mut m = CompiledPattern::new(alternation())?.matcher(&seq);
    assert!(m.find());
    assert_eq!(0..1, m.group(0).unwrap());

    // The first alternative is abandoned when the rest cannot match.
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        alternation(),
        Expr::sequence_end(),
    ]))?;
    let mut m = pattern.matcher(&seq);
    assert!(m.find());
    assert_eq!(0..2, m.group(0).unwrap());
    Ok(())
}

#[test]
fn anchors_refer_to_the_whole_sequence() -> Result {
    let seq = chars("aa");

    let start = CompiledPattern::new(Expr::sequence(vec![
        Expr::sequence_start(),
        Expr::literal('a'),
    ]))?;
    assert_eq!(vec![Span::new(0, 1)], find_spans(&start, &seq, Config::new()));
    let mut m = start.matcher(&seq);
    m.region(1, 2)?;
    assert!(!m.find());

    let end = CompiledPattern::new(Expr::sequence(vec![
        Expr::literal('a'),
        Expr::sequence_end(),
    ]))?;
    assert_eq!(vec![Span::new(1, 2)], find_spans(&end, &seq, Config::new()));
    let mut m = end.matcher(&seq);
    m.region(0, 1)?;
    assert!(!m.find());
    Ok(())
}

#[test]
fn empty_matches_advance() -> Result {
    let pattern = CompiledPattern::new(Expr::star(Expr::literal('a')))?;
    let seq = chars("baa");
    let spans = find_spans(&pattern, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 0), Span::new(1, 3)], spans);
    Ok(())
}

#[test]
fn backreference_repeats_a_group() -> Result {
    // the (cat|dog) \1?
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::literal("the"),
        Expr::group(Expr::or(vec![
            Expr::literal("cat"),
            Expr::literal("dog"),
        ])),
        Expr::optional(Expr::backref(1)?),
    ]))?;
    let seq = words("the dog dog and the cat cat cat");
    let spans = find_spans(&pattern, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 3), Span::new(4, 7)], spans);
    Ok(())
}

#[test]
fn backreference_with_custom_equality() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::plus(Expr::any())),
        Expr::backref_with(|a: &&str, b: &&str| a.eq_ignore_ascii_case(b), 1)?,
    ]))?;
    let seq = words("New York new york");
    let mut m = pattern.matcher(&seq);
    assert!(m.matches());
    assert_eq!(Some(&["New", "York"][..]), m.group_nodes(1));

    let exact = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::plus(Expr::any())),
        Expr::backref(1)?,
    ]))?;
    assert!(!exact.matcher(&seq).matches());
    Ok(())
}

#[test]
fn backreference_to_unset_group_fails() -> Result {
    // (?:(a)|b)\1
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::or(vec![Expr::group(Expr::literal('a')), Expr::literal('b')]),
        Expr::backref(1)?,
    ]))?;
    let seq = chars("bbaa");
    let spans = find_spans(&pattern, &seq, Config::new());
    assert_eq!(vec![Span::new(2, 4)], spans);
    Ok(())
}

#[test]
fn backreference_to_empty_group_matches_nothing() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::star(Expr::literal('a'))),
        Expr::backref(1)?,
        Expr::literal('b'),
    ]))?;
    let seq = chars("b");
    let mut m = pattern.matcher(&seq);
    assert!(m.find());
    assert_eq!(0..1, m.group(0).unwrap());
    assert_eq!(0..0, m.group(1).unwrap());
    Ok(())
}

#[test]
fn backreference_inside_its_own_group_fails() -> Result {
    let pattern = CompiledPattern::new(Expr::group(Expr::sequence(vec![
        Expr::literal('a'),
        Expr::backref(1)?,
    ])))?;
    assert!(!pattern.is_match(&chars("aaaa")));
    Ok(())
}

/// Proposes "new" alone or followed by the next word.
fn new_phrase(seq: &[&str], from: usize) -> Vec<Span> {
    if seq.get(from) != Some(&"new") {
        return vec![];
    }
    vec![Span::new(from, from + 1), Span::new(from, from + 2)]
}

#[test]
fn multi_node_alternatives_are_explored() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::multi_node(new_phrase)),
        Expr::literal("city"),
    ]))?;
    let seq = words("new york city hall");
    let mut m = pattern.matcher(&seq);
    assert!(m.find());
    assert_eq!(0..3, m.group(0).unwrap());
    assert_eq!(Some(&["new", "york"][..]), m.group_nodes(1));
    Ok(())
}

#[test]
fn multi_node_order_is_priority() -> Result {
    let seq = words("new york");
    let shortest = CompiledPattern::new(Expr::multi_node(new_phrase))?;
    let spans = find_spans(&shortest, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 1)], spans);

    let longest = CompiledPattern::new(Expr::multi_node(
        |seq: &[&str], from: usize| {
            let mut spans = new_phrase(seq, from);
            spans.reverse();
            spans
        },
    ))?;
    let spans = find_spans(&longest, &seq, Config::new());
    assert_eq!(vec![Span::new(0, 2)], spans);

    // Intervals that leave the region are ignored.
    let mut m = longest.matcher(&seq);
    m.region(0, 1)?;
    assert!(m.find());
    assert_eq!(0..1, m.group(0).unwrap());
    Ok(())
}

struct Number;

impl ElementPredicate<&'static str> for Number {
    fn matches(&self, elem: &&'static str) -> bool {
        elem.parse::<u32>().is_ok()
    }

    fn match_with_extraction(&self, elem: &&'static str) -> Extraction {
        match elem.parse::<u32>() {
            Ok(n) => Extraction::MatchWith(Arc::new(n)),
            Err(_) => Extraction::NoMatch,
        }
    }
}

#[test]
fn extracted_values_are_recorded() -> Result {
    let pattern = CompiledPattern::new(Expr::sequence(vec![
        Expr::group(Expr::plus(Expr::node(Number))),
        Expr::literal("apples"),
    ]))?;
    let seq = words("buy 1 22 apples");

    let mut m = pattern.matcher(&seq);
    assert!(m.find());
    assert!(m.node_extraction(1).is_none());

    m.configure(Config::new().extract(true));
    assert!(m.find());
    assert_eq!(1..4, m.group(0).unwrap());
    let value = m.node_extraction(2).expect("an extracted value");
    assert_eq!(Some(&22), (**value).downcast_ref::<u32>());
    let values: Vec<u32> = m
        .group_extractions(1)
        .map(|(_, v)| *(**v).downcast_ref::<u32>().unwrap())
        .collect();
    assert_eq!(vec![1, 22], values);
    assert!(m.node_extraction(3).is_none());

    let result = m.to_match_result()?;
    assert_eq!(2, result.extractions_in(Span::new(0, 4)).count());
    Ok(())
}
