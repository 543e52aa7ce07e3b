// Built-in stopword set for visualization text (Indonesian + English)
use once_cell::sync::Lazy;
use std::collections::HashSet;

pub(super) static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Indonesian
        "yang", "dan", "di", "ke", "dari", "ini", "itu", "untuk", "dengan", "ada", "tidak",
        "nya", "aku", "saya", "kamu", "dia", "kita", "kami", "mereka", "juga", "sudah", "udah",
        "akan", "bisa", "jadi", "karena", "kalau", "kalo", "tapi", "atau", "pada", "sama",
        "aja", "saja", "lagi", "banget", "sih", "deh", "dong", "kok", "nih", "tuh", "mah",
        "yg", "gak", "ga", "gk", "nggak", "enggak", "tak", "kan", "lah", "pun", "buat",
        "oleh", "dalam", "seperti", "masih", "harus", "lebih", "sangat", "semua", "apa",
        "siapa", "mana", "kapan", "bagaimana", "gimana", "kenapa", "begitu", "gitu", "ya",
        "iya", "dgn", "utk", "krn", "jd", "sdh", "blm", "belum", "pernah", "setelah",
        "sebelum", "hanya", "cuma", "telah", "bahwa", "para", "adalah", "ia", "mau",
        // English
        "the", "and", "for", "are", "but", "not", "you", "your", "all", "any", "can", "had",
        "her", "was", "one", "our", "out", "has", "have", "him", "his", "how", "its", "who",
        "this", "that", "with", "they", "them", "their", "what", "when", "where", "which",
        "will", "would", "there", "been", "from", "just", "like", "very", "into", "than",
        "then", "also", "more", "some", "only", "about", "here", "were", "being", "because",
    ]
    .into_iter()
    .collect()
});
