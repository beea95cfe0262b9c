use std::collections::HashMap;

pub fn default_version() -> u32 {
    1
}

pub fn default_cache_ttl_sec() -> u64 {
    3600
}

pub fn default_cache_capacity() -> usize {
    50
}

pub fn default_coordinate_precision() -> u32 {
    3
}

pub fn default_stale_grace_sec() -> u64 {
    86_400
}

pub fn default_max_calls() -> usize {
    100
}

pub fn default_window_sec() -> u64 {
    60
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    500
}

pub fn default_search_base_url() -> String {
    "https://dapi.kakao.com".to_string()
}

pub fn default_api_key_env() -> String {
    "KAKAO_REST_API_KEY".to_string()
}

pub fn default_radius_m() -> u32 {
    1000
}

pub fn default_result_limit() -> u32 {
    15 // provider maximum page size
}

pub fn default_search_timeout_sec() -> u64 {
    10
}

pub fn default_target_count() -> usize {
    20
}

pub fn default_dedup_distance_m() -> f64 {
    30.0
}

pub fn default_companion_picks() -> usize {
    3
}

pub fn default_variety_picks() -> usize {
    2
}

pub fn default_min_categories() -> usize {
    6
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn default_companions() -> HashMap<String, Vec<String>> {
    let mut table = HashMap::new();
    table.insert(
        "family".to_string(),
        strings(&[
            "박물관", "놀이공원", "동물원", "수족관", "과학관", "패밀리레스토랑", "공원",
            "키즈카페", "도서관", "체험학습장",
        ]),
    );
    table.insert(
        "friends".to_string(),
        strings(&[
            "방탈출카페", "보드게임카페", "코인노래방", "펍", "볼링장", "만화카페", "다트바",
            "팝업스토어",
        ]),
    );
    table.insert(
        "couple".to_string(),
        strings(&[
            "분위기좋은카페", "미술관", "와인바", "전시회", "디저트카페", "야경좋은곳", "공연장",
            "로맨틱레스토랑",
        ]),
    );
    table.insert(
        "solo".to_string(),
        strings(&[
            "산책길", "조용한카페", "독립서점", "미술관", "도서관", "요가센터", "등산로",
            "스터디카페",
        ]),
    );
    table
}

pub fn default_variety() -> Vec<String> {
    strings(&["테마카페", "문화시설", "관광명소", "공원", "쇼핑", "엔터테인먼트"])
}

pub fn default_fallback() -> Vec<String> {
    strings(&["카페", "음식점", "문화시설", "관광명소"])
}

pub fn default_category_codes() -> HashMap<String, String> {
    [
        ("카페", "CE7"),
        ("음식점", "FD6"),
        ("식당", "FD6"),
        ("문화시설", "CT1"),
        ("관광명소", "AT4"),
        ("공원", "AT4"),
        ("대형마트", "MT1"),
        ("cafe", "CE7"),
        ("restaurant", "FD6"),
        ("museum", "CT1"),
        ("park", "AT4"),
        ("attraction", "AT4"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
