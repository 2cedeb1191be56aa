//! Linguistic resources behind the normalizer: word splitting, stopword
//! dictionaries and diacritic folding.
//!
//! [`TextAnalyzer`] is the seam; [`StandardAnalyzer`] is the stock
//! implementation backed by Unicode decomposition and bundled stopword lists.

use lazy_static::lazy_static;
use std::collections::{BTreeMap, HashMap, HashSet};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref STOPWORDS: HashMap<&'static str, &'static [&'static str]> = {
        let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        m.insert("pt", PORTUGUESE);
        m.insert("en", ENGLISH);
        m
    };
    // Letters that canonical decomposition leaves untouched.
    static ref BASE_FOLDING: BTreeMap<char, &'static str> = [
        ('ß', "ss"),
        ('æ', "ae"),
        ('œ', "oe"),
        ('ø', "o"),
        ('đ', "d"),
        ('ð', "d"),
        ('ł', "l"),
        ('þ', "th"),
        ('ı', "i"),
    ]
    .into_iter()
    .collect();
}

const PORTUGUESE: &[&str] = &[
    "a","à","ao","aos","aquela","aquelas","aquele","aqueles","aquilo","as","às","até",
    "com","como","da","das","de","dela","delas","dele","deles","depois","do","dos",
    "e","é","ela","elas","ele","eles","em","entre","era","eram","éramos","essa","essas","esse","esses","esta","está",
    "estamos","estão","estar","estas","estava","estavam","estávamos","este","esteja","estejam","estejamos","estes",
    "esteve","estive","estivemos","estiver","estivera","estiveram","estivéramos","estiverem","estivermos",
    "estivesse","estivessem","estivéssemos","estou","eu",
    "foi","fomos","for","fora","foram","fôramos","forem","formos","fosse","fossem","fôssemos","fui",
    "há","haja","hajam","hajamos","hão","havemos","haver","hei","houve","houvemos","houver","houvera","houverá",
    "houveram","houvéramos","houverão","houverei","houverem","houveremos","houveria","houveriam","houveríamos",
    "houvermos","houvesse","houvessem","houvéssemos",
    "isso","isto","já","lhe","lhes","mais","mas","me","mesmo","meu","meus","minha","minhas","muito",
    "na","não","nas","nem","no","nos","nós","nossa","nossas","nosso","nossos","num","numa",
    "o","os","ou","para","pela","pelas","pelo","pelos","por","qual","quando","que","quem",
    "são","se","seja","sejam","sejamos","sem","ser","será","serão","serei","seremos","seria","seriam","seríamos",
    "seu","seus","só","somos","sou","sua","suas",
    "também","te","tem","tém","temos","tenha","tenham","tenhamos","tenho","terá","terão","terei","teremos",
    "teria","teriam","teríamos","teu","teus","teve","tinha","tinham","tínhamos","tive","tivemos","tiver",
    "tivera","tiveram","tivéramos","tiverem","tivermos","tivesse","tivessem","tivéssemos","tu","tua","tuas",
    "um","uma","você","vocês","vos",
];

const ENGLISH: &[&str] = &[
    "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
    "be","because","been","before","being","below","between","both","but","by",
    "can","cannot","could","did","do","does","doing","down","during",
    "each","few","for","from","further",
    "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
    "i","if","in","into","is","it","its","itself",
    "me","more","most","my","myself",
    "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
    "same","she","should","so","some","such",
    "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
    "under","until","up","very",
    "was","we","were","what","when","where","which","while","who","whom","why","with","would",
    "you","your","yours","yourself","yourselves",
];

/// Word splitting, stopword lookup and diacritic folding used by the normalizer.
pub trait TextAnalyzer: Send + Sync {
    /// Split already-cleaned text into raw tokens.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Stopword dictionary for `locale`, as written (not yet folded).
    fn stopwords(&self, locale: &str) -> HashSet<String>;

    /// Map accented letters to their base Latin form.
    fn fold_diacritics(&self, text: &str) -> String;
}

/// Whitespace splitting, bundled `pt`/`en` stopword lists, NFKD-based folding.
#[derive(Debug, Clone, Default)]
pub struct StandardAnalyzer {
    folding: BTreeMap<char, String>,
}

impl StandardAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add folding entries on top of the built-in table. Entries here win.
    pub fn with_folding(folding: BTreeMap<char, String>) -> Self {
        Self { folding }
    }

    pub fn supports_locale(locale: &str) -> bool {
        STOPWORDS.contains_key(locale)
    }
}

impl TextAnalyzer for StandardAnalyzer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn stopwords(&self, locale: &str) -> HashSet<String> {
        match STOPWORDS.get(locale) {
            Some(words) => words.iter().map(|w| w.to_string()).collect(),
            None => {
                tracing::warn!(locale, "no stopword list for locale, filtering disabled");
                HashSet::new()
            }
        }
    }

    fn fold_diacritics(&self, text: &str) -> String {
        let mut mapped = String::with_capacity(text.len());
        for c in text.chars() {
            if let Some(rep) = self.folding.get(&c) {
                mapped.push_str(rep);
            } else if let Some(rep) = BASE_FOLDING.get(&c) {
                mapped.push_str(rep);
            } else {
                mapped.push(c);
            }
        }
        mapped.nfkd().filter(|c| !is_combining_mark(*c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_portuguese_accents() {
        let a = StandardAnalyzer::new();
        assert_eq!(a.fold_diacritics("saúde benefícios não à férias ção"), "saude beneficios nao a ferias cao");
    }

    #[test]
    fn folds_letters_without_decomposition() {
        let a = StandardAnalyzer::new();
        assert_eq!(a.fold_diacritics("straße łódź"), "strasse lodz");
    }

    #[test]
    fn custom_folding_overrides_builtin() {
        let mut table = BTreeMap::new();
        table.insert('ß', "s".to_string());
        let a = StandardAnalyzer::with_folding(table);
        assert_eq!(a.fold_diacritics("ß"), "s");
    }

    #[test]
    fn unknown_locale_has_no_stopwords() {
        let a = StandardAnalyzer::new();
        assert!(a.stopwords("xx").is_empty());
        assert!(a.stopwords("pt").contains("não"));
        assert!(StandardAnalyzer::supports_locale("en"));
    }
}
