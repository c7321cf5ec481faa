//! Безопасные для файловой системы идентификаторы проектов

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"[/\\?%*:|"<>.\s]"#).unwrap();
}

/// Максимальная длина читаемой части идентификатора (в символах)
const READABLE_PREFIX_LEN: usize = 20;
/// Количество hex-символов хеша в идентификаторе
const HASH_LEN: usize = 6;

/// Превратить произвольное имя проекта в идентификатор для путей
///
/// Читаемая часть (до 20 символов) позволяет найти источник, короткий md5
/// от полного имени разводит имена с одинаковым началом.
pub fn safe_project_name(name: &str) -> String {
    let clean = UNSAFE_CHARS.replace_all(name, "_");
    let readable: String = clean.trim().chars().take(READABLE_PREFIX_LEN).collect();
    let digest = format!("{:x}", md5::compute(name.as_bytes()));

    format!("{}_{}", readable, &digest[..HASH_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_characters_replaced() {
        let id = safe_project_name("a/b\\c?d%e*f:g|h\"i<j>k.l m");
        let (readable, hash) = id.rsplit_once('_').unwrap();
        assert_eq!(readable, "a_b_c_d_e_f_g_h_i_j_");
        assert_eq!(hash.len(), 6);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_deterministic_and_distinct() {
        assert_eq!(safe_project_name("南投新聞 2024"), safe_project_name("南投新聞 2024"));

        let long_a = "一".repeat(30) + "甲";
        let long_b = "一".repeat(30) + "乙";
        let id_a = safe_project_name(&long_a);
        let id_b = safe_project_name(&long_b);
        assert_ne!(id_a, id_b);
        assert!(id_a.starts_with(&"一".repeat(20)));
    }

    #[test]
    fn test_known_digest() {
        // md5("test") = 098f6bcd4621d373cade4e832627b4f6
        assert_eq!(safe_project_name("test"), "test_098f6b");
    }
}
