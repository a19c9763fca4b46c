//! URL slugs from product names.
//!
//! Cyrillic is romanized with the Ukrainian national transliteration table
//! (KMU 2010), including its word-initial forms (`Є` → `ye`, `Ї` → `yi`,
//! `Й` → `y`, `Ю` → `yu`, `Я` → `ya`) and the `зг` → `zgh` rule.

/// Longest slug produced by [`slugify`].
pub const MAX_SLUG_LEN: usize = 80;

/// Build a lowercase ASCII slug: `"Сумка «Ярина» 2.0"` → `"sumka-yaryna-2-0"`.
///
/// Returns an empty string when nothing transliterable remains; callers
/// decide on a fallback.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut word_start = true;
    let mut prev: Option<char> = None;

    for raw in input.chars() {
        let c = raw.to_lowercase().next().unwrap_or(raw);

        if c == '\'' || c == '’' || c == 'ʼ' || c == 'ь' || c == 'ъ' {
            prev = Some(c);
            continue;
        }

        if c.is_ascii_alphanumeric() {
            out.push(c);
            word_start = false;
        } else if let Some(latin) = transliterate(c, word_start, prev) {
            out.push_str(latin);
            word_start = false;
        } else {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            word_start = true;
        }
        prev = Some(c);
    }

    let mut slug = out.trim_end_matches('-').to_owned();
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        slug = slug.trim_end_matches('-').to_owned();
    }
    slug
}

fn transliterate(c: char, word_start: bool, prev: Option<char>) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' if prev == Some('з') => "gh",
        'г' => "h",
        'ґ' => "g",
        'д' => "d",
        'е' | 'э' | 'ё' => "e",
        'є' if word_start => "ye",
        'є' => "ie",
        'ж' => "zh",
        'з' => "z",
        'и' | 'ы' => "y",
        'і' => "i",
        'ї' if word_start => "yi",
        'ї' => "i",
        'й' if word_start => "y",
        'й' => "i",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ю' if word_start => "yu",
        'ю' => "iu",
        'я' if word_start => "ya",
        'я' => "ia",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ukrainian_names() {
        assert_eq!(slugify("Сумка «Ярина» 2.0"), "sumka-yaryna-2-0");
        assert_eq!(slugify("Гаманець Їжачок"), "hamanets-yizhachok");
        assert_eq!(slugify("Юлія"), "yuliia");
        assert_eq!(slugify("Згорток"), "zghortok");
        assert_eq!(slugify("Щоденник з м'якою обкладинкою"), "shchodennyk-z-miakoiu-obkladynkoiu");
    }

    #[test]
    fn test_word_initial_forms() {
        assert_eq!(slugify("Євген"), "yevhen");
        assert_eq!(slugify("Йога мат"), "yoha-mat");
        assert_eq!(slugify("Київ"), "kyiv");
        assert_eq!(slugify("Стрий"), "stryi");
    }

    #[test]
    fn test_latin_and_separators() {
        assert_eq!(slugify("  Tote Bag -- XL!! "), "tote-bag-xl");
        assert_eq!(slugify("Mini_Bag"), "mini-bag");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_length_is_capped() {
        let long = "дуже ".repeat(40);
        let slug = slugify(&long);
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }
}
