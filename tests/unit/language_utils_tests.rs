/*!
 * Tests for language code utilities
 */

use doctrans::language_utils::{deepl_code, get_language_name, language_codes_match, web_code};

#[test]
fn test_languageCodesMatch_withDifferentForms_shouldMatch() {
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("zh-CN", "zho"));
    assert!(!language_codes_match("fr", "zh"));
    assert!(!language_codes_match("fr", "??"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("fr").unwrap(), "French");
    assert!(get_language_name("q").is_err());
}

#[test]
fn test_backendCodes_withRegionalVariant_shouldNormalize() {
    assert_eq!(web_code("zh_cn"), "zh-CN");
    assert_eq!(web_code("fra"), "fr");
    assert_eq!(deepl_code("zh-cn"), "ZH");
}
