use quickcheck::{Arbitrary, Gen};
use seq_automata::{matcher::Config, CompiledPattern, Expr, Span};

/// Split a sentence into words.
pub fn words(sentence: &'static str) -> Vec<&'static str> {
    sentence.split_whitespace().collect()
}

/// Split a string into its characters.
pub fn chars(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Collect the group spans of every match reported by `find`.
pub fn find_groups<T>(
    pattern: &CompiledPattern<T>,
    haystack: &[T],
    config: Config,
) -> Vec<Vec<Option<Span>>> {
    let mut m = pattern.matcher(haystack);
    m.configure(config);
    m.find_iter().map(|mres| mres.iter().collect()).collect()
}

/// Collect the span of every match reported by `find`.
pub fn find_spans<T>(
    pattern: &CompiledPattern<T>,
    haystack: &[T],
    config: Config,
) -> Vec<Span> {
    let mut m = pattern.matcher(haystack);
    m.configure(config);
    m.find_iter().map(|mres| mres.span()).collect()
}

/// A short sequence over the alphabet `{0, 1, 2}`, so that random patterns
/// match it often.
#[derive(Clone, Debug)]
pub struct Hay(pub Vec<u8>);

impl Arbitrary for Hay {
    fn arbitrary(g: &mut Gen) -> Hay {
        let len = usize::arbitrary(g) % 7;
        Hay((0..len).map(|_| u8::arbitrary(g) % 3).collect())
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Hay>> {
        Box::new(self.0.shrink().map(Hay))
    }
}

/// A small random pattern over the alphabet of `Hay`.
#[derive(Clone, Debug)]
pub enum Pat {
    /// Matches any element whose bit is set in the mask.
    Class(u8),
    Seq(Vec<Pat>),
    Or(Vec<Pat>),
    Group(Box<Pat>),
    Repeat(Box<Pat>, usize, Option<usize>, bool),
}

impl Pat {
    fn gen(g: &mut Gen, depth: usize) -> Pat {
        let choice = if depth == 0 { 0 } else { u8::arbitrary(g) % 5 };
        match choice {
            0 => Pat::Class(u8::arbitrary(g) % 7 + 1),
            1 => {
                let len = usize::arbitrary(g) % 3 + 1;
                Pat::Seq((0..len).map(|_| Pat::gen(g, depth - 1)).collect())
            }
            2 => {
                let len = usize::arbitrary(g) % 2 + 2;
                Pat::Or((0..len).map(|_| Pat::gen(g, depth - 1)).collect())
            }
            3 => Pat::Group(Box::new(Pat::gen(g, depth - 1))),
            _ => {
                let min = usize::arbitrary(g) % 3;
                let max = match u8::arbitrary(g) % 3 {
                    0 => None,
                    n => Some(min + usize::from(n) - 1),
                };
                let greedy = bool::arbitrary(g);
                Pat::Repeat(Box::new(Pat::gen(g, depth - 1)), min, max, greedy)
            }
        }
    }

    /// Build the pattern with single element nodes.
    pub fn to_expr(&self) -> Expr<u8> {
        self.build(&|mask| Expr::node(move |b: &u8| mask & (1 << *b) != 0))
    }

    /// Build the pattern with multi-element nodes that only ever propose a
    /// single element.
    pub fn to_multi_expr(&self) -> Expr<u8> {
        self.build(&|mask| {
            Expr::multi_node(move |seq: &[u8], i: usize| {
                if i < seq.len() && mask & (1 << seq[i]) != 0 {
                    vec![Span::new(i, i + 1)]
                } else {
                    vec![]
                }
            })
        })
    }

    fn build(&self, leaf: &dyn Fn(u8) -> Expr<u8>) -> Expr<u8> {
        match *self {
            Pat::Class(mask) => leaf(mask),
            Pat::Seq(ref pats) => {
                Expr::sequence(pats.iter().map(|p| p.build(leaf)))
            }
            Pat::Or(ref pats) => Expr::or(pats.iter().map(|p| p.build(leaf))),
            Pat::Group(ref pat) => Expr::group(pat.build(leaf)),
            Pat::Repeat(ref pat, min, max, greedy) => {
                // OK because 'max' is never less than 'min'.
                Expr::repeat(pat.build(leaf), min, max, greedy).unwrap()
            }
        }
    }
}

impl Arbitrary for Pat {
    fn arbitrary(g: &mut Gen) -> Pat {
        Pat::gen(g, 3)
    }
}
