//! Tokenization shared by the indexer's corpus BM25 model, the search
//! stage's surrogate BM25 model, and theme-keyword extraction. All three
//! must agree on the exact same token stream for scores to be comparable.

/// Combined Portuguese/English stopword list. Fixed so that scores stay
/// reproducible across runs and stages; do not make this configurable.
const STOPWORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can",
    "had", "has", "was", "were", "will", "with", "that", "this", "from",
    "they", "been", "have", "their", "what", "which", "who", "when",
    "where", "why", "how", "about", "into", "over", "under", "then",
    "than", "them", "there", "here", "such", "some", "more", "most",
    "other", "each", "only", "also", "just", "like", "very", "because",
    "while", "after", "before", "between", "through", "during", "above",
    "below", "out", "off", "again", "further", "once", "does", "did",
    "doing", "being", "having", "your", "our", "its", "his", "her",
    // Portuguese
    "para", "com", "uma", "um", "uns", "umas", "que", "não", "mais",
    "como", "mas", "ele", "ela", "eles", "elas", "pelo", "pela", "pelos",
    "pelas", "isso", "isto", "aquele", "aquela", "aqueles", "aquelas",
    "seu", "sua", "seus", "suas", "meu", "minha", "meus", "minhas",
    "nosso", "nossa", "nossos", "nossas", "esse", "essa", "esses",
    "essas", "este", "esta", "estes", "estas", "ser", "estar", "foi",
    "são", "era", "eram", "quando", "onde", "porque", "sobre", "entre",
    "durante", "antes", "depois", "ainda", "também", "muito", "muita",
    "sempre", "nunca", "já", "então", "até", "sem", "sob", "após",
];

/// Lowercase, fold diacritic-bearing characters and `-`/space through, turn
/// everything else into a separator, split on whitespace, and drop tokens
/// shorter than 3 characters or in [`STOPWORDS`].
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        if is_allowed(ch) {
            cleaned.push(ch);
        } else {
            cleaned.push(' ');
        }
    }
    cleaned
        .split_whitespace()
        .filter(|tok| tok.chars().count() >= 3 && !STOPWORDS.contains(tok))
        .map(|tok| tok.to_string())
        .collect()
}

fn is_allowed(ch: char) -> bool {
    matches!(
        ch,
        'a'..='z'
            | '0'..='9'
            | 'á' | 'à' | 'â' | 'ã'
            | 'é' | 'è' | 'ê'
            | 'í' | 'ì' | 'î'
            | 'ó' | 'ò' | 'ô' | 'õ'
            | 'ú' | 'ù' | 'û'
            | 'ç'
            | '-'
            | ' '
    )
}

/// Inverse of [`tokenize`]'s whitespace splitting, joins tokens back into
/// a single string. Used by the idempotence property: tokenizing the
/// detokenized output of a tokenization reproduces it.
pub fn detokenize(tokens: &[String]) -> String {
    tokens.join(" ")
}
