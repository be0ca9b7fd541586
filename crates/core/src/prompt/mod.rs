//! Natural-language instructions for each query kind.
//!
//! Prompts are written in Persian because the grounded sources (tgju.org and the
//! domestic press) are Persian; the declared output schema lives in [`schema`].

pub mod schema;

use crate::time::iran::DateInfo;
use serde::{Deserialize, Serialize};

pub use schema::response_schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Sentiment,
    LivePrices,
    TopOpportunities,
    SymbolAnalysis,
}

impl QueryKind {
    /// Sentiment is the only free-text query.
    pub fn expects_json(&self) -> bool {
        !matches!(self, QueryKind::Sentiment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisCategory {
    Bourse,
    Gold,
    Currency,
}

impl AnalysisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisCategory::Bourse => "bourse",
            AnalysisCategory::Gold => "gold",
            AnalysisCategory::Currency => "currency",
        }
    }

    /// Fixed query text for categories that do not accept a user symbol.
    pub fn canonical_query(&self) -> Option<&'static str> {
        match self {
            AnalysisCategory::Bourse => None,
            AnalysisCategory::Gold => Some("سکه امامی و طلای ۱۸ عیار"),
            AnalysisCategory::Currency => Some("دلار بازار آزاد"),
        }
    }

    pub fn accepts_free_text(&self) -> bool {
        self.canonical_query().is_none()
    }

    /// Symbol actually sent to the provider. Returns `None` when a free-text
    /// category was given an empty symbol.
    pub fn resolve_symbol(&self, user_input: &str) -> Option<String> {
        if let Some(fixed) = self.canonical_query() {
            return Some(fixed.to_string());
        }
        let trimmed = user_input.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl std::str::FromStr for AnalysisCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bourse" => Ok(AnalysisCategory::Bourse),
            "gold" => Ok(AnalysisCategory::Gold),
            "currency" => Ok(AnalysisCategory::Currency),
            other => anyhow::bail!("unknown category {other:?} (expected bourse, gold or currency)"),
        }
    }
}

pub fn sentiment_prompt(date: &DateInfo) -> String {
    format!(
        "امروز {} است. بر اساس اخبار سیاسی و اقتصادی منتشر شده در ۲۴ ساعت گذشته و دیتای سایت tgju.org، \
یک تحلیل استراتژیک کوتاه از نبض امروز بازار ایران ارائه بده. داده‌های قدیمی‌تر از ۲۴ ساعت را نادیده بگیر.",
        date.shamsi
    )
}

pub fn live_prices_prompt(date: &DateInfo) -> String {
    format!(
        "امروز {} است. سریعاً به سایت tgju.org مراجعه کن و قیمت‌های لحظه‌ای (Live) زیر را استخراج کن.\n\
داده‌ها باید دقیقاً مربوط به قیمت‌های امروز باشد و داده‌های قدیمی‌تر از ۲۴ ساعت را نادیده بگیر. \
اگر بازار بسته است، آخرین قیمت پایانی امروز را بیاور:\n\
1. شاخص کل بورس (symbol: TEDPIX)\n\
2. دلار بازار آزاد (symbol: USD)\n\
3. سکه امامی (symbol: SEKE)\n\
4. طلای 18 عیار (symbol: GOLD18)\n\
خروجی: [{{name, symbol, price, changePercent}}] بصورت JSON.",
        date.shamsi
    )
}

pub fn opportunities_prompt(date: &DateInfo) -> String {
    format!(
        "امروز {} است. بر اساس اخبار امروز، وضعیت تابلو بورس ایران و قیمت‌های سایت tgju.org، \
لیستی از ۱۰ نماد (بورس، طلا یا ارز) که بیشترین احتمال سوددهی را در کوتاه مدت با کمترین ریسک دارند استخراج کن. \
داده‌های قدیمی‌تر از ۲۴ ساعت را نادیده بگیر.\n\
خروجی دقیقا یک لیست JSON با این فرمت باشد:\n\
[{{ \"name\": \"نام نماد\", \"symbol\": \"نماد\", \"expectedReturn\": \"درصد سود تخمینی\", \"riskLevel\": \"Low/Medium\", \"recommendation\": \"BUY/HOLD\" }}]\n\
نمادها باید واقعی و بر اساس دیتای امروز باشند.",
        date.shamsi
    )
}

pub fn symbol_analysis_prompt(date: &DateInfo, symbol: &str, category: AnalysisCategory) -> String {
    format!(
        "امروز {shamsi} (برابر با {gregorian}) است.\n\
به عنوان تحلیلگر ارشد، نماد \"{symbol}\" ({category}) را منحصراً بر اساس داده‌های لحظه‌ای و اخبار امروز تحلیل کن.\n\n\
دستورالعمل حیاتی:\n\
۱. با استفاده از جستجوی وب، آخرین قیمت و تغییرات را مستقیماً از سایت tgju.org یا منابع خبری معتبر برای امروز پیدا کن. \
داده‌های قدیمی‌تر از ۲۴ ساعت را نادیده بگیر.\n\
۲. تحلیل سیاسی را بر اساس اخبار داغ همین امروز (تنش‌ها، مذاکرات، تصمیمات بانکی) انجام بده.\n\
۳. تاریخ دقیق قیمتی که پیدا کردی را در فیلد dataDate ذکر کن.\n\
۴. confidence عددی بین ۰ تا ۱۰۰ باشد و targets به ترتیب صعودی.\n\n\
خروجی حتما JSON باشد.",
        shamsi = date.shamsi,
        gregorian = date.gregorian,
        category = category.as_str(),
    )
}
