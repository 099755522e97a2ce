//! 下拉選項的靜態資料表

/// (代碼, 顯示名稱)
pub type OptionEntry = (&'static str, &'static str);

pub const CURRENCIES: &[OptionEntry] = &[
    ("INR", "印度卢比"),
    ("USD", "美元"),
    ("USDT", "泰达币"),
    ("BRL", "巴西雷亚尔"),
    ("IDR", "印尼盾"),
    ("PHP", "菲律宾比索"),
    ("VND", "越南盾"),
    ("THB", "泰铢"),
    ("MXN", "墨西哥比索"),
    ("PKR", "巴基斯坦卢比"),
    ("BDT", "孟加拉塔卡"),
];

pub const COUNTRIES: &[OptionEntry] = &[
    ("IN", "印度"),
    ("BR", "巴西"),
    ("ID", "印度尼西亚"),
    ("PH", "菲律宾"),
    ("VN", "越南"),
    ("TH", "泰国"),
    ("MX", "墨西哥"),
    ("PK", "巴基斯坦"),
    ("BD", "孟加拉国"),
    ("US", "美国"),
];

/// 手機國碼
pub const PHONE_COUNTRY_CODES: &[OptionEntry] = &[
    ("+91", "印度"),
    ("+55", "巴西"),
    ("+62", "印度尼西亚"),
    ("+63", "菲律宾"),
    ("+84", "越南"),
    ("+66", "泰国"),
    ("+52", "墨西哥"),
    ("+92", "巴基斯坦"),
    ("+880", "孟加拉国"),
    ("+1", "美国"),
    ("+86", "中国"),
];

pub const TRX_TYPES: &[OptionEntry] = &[("in", "代收"), ("out", "代付")];

pub const TRX_METHODS: &[OptionEntry] = &[
    ("upi", "UPI"),
    ("bank_transfer", "银行转账"),
    ("wallet", "电子钱包"),
    ("card", "银行卡"),
    ("qr", "扫码"),
    ("pix", "PIX"),
];

pub const CHANNEL_CODES: &[OptionEntry] = &[
    ("paytm", "Paytm"),
    ("razorpay", "Razorpay"),
    ("cashfree", "Cashfree"),
    ("xendit", "Xendit"),
    ("gcash", "GCash"),
    ("momo", "MoMo"),
    ("promptpay", "PromptPay"),
    ("spei", "SPEI"),
    ("easypaisa", "Easypaisa"),
    ("bkash", "bKash"),
    ("pix_direct", "PIX Direct"),
];

/// 商戶類別
pub const USER_CATEGORIES: &[OptionEntry] = &[
    ("personal", "个人"),
    ("company", "企业"),
];

pub fn codes(table: &[OptionEntry]) -> Vec<&'static str> {
    table.iter().map(|(code, _)| *code).collect()
}

pub fn label_of(table: &[OptionEntry], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, label)| *label)
}

pub fn contains(table: &[OptionEntry], code: &str) -> bool {
    table.iter().any(|(candidate, _)| *candidate == code)
}
