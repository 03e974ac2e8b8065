//! The fixed instructions sent with every document.

use crate::category::Category;

/// System message: the model acts as a specialist classifier of
/// religious-text excerpts.
pub const SYSTEM_PROMPT: &str =
    "أنت مساعد ذكي متخصص في تحليل النصوص الشرعية واستخراج الكشافات العلمية منها بدقة.";

const INTRO: &str = "اقرأ النص التالي من كتاب لشيخ الإسلام ابن تيمية، واستخرج فقط الفقرات أو المواضع التي ترى أنها تحتوي على كشاف علمي من الأنواع التالية:";

const COLUMNS: &str = "🔹 لكل كشاف، أخرج الحقول التالية:
- مطلع الفقرة أو جملة قصيرة تمثل موقع الكشاف
- نوع الكشاف (من القائمة أعلاه)
- عنوان الكشاف المناسب
- سبب التصنيف (لماذا صنفتها ضمن هذا الكشاف)";

const FORMAT: &str = "🔸 اكتب كل كشاف في سطر مستقل، وافصل بين الأعمدة الأربعة بالرمز | بهذا الترتيب:
مطلع الفقرة | نوع الكشاف | عنوان الكشاف | سبب التصنيف
لا تبدأ السطر ولا تنهه بالرمز |، ولا تستخدم جداول Markdown.
وانقل مطلع الفقرة حرفيًا كما ورد في النص.";

const SCOPE: &str =
    "🔸 لا تُخرج إلا المواضع التي تحتوي كشافًا فعليًا، ولا تُلخّص أو تُعلق على بقية النص.";

const TEXT_HEADING: &str = "النص الكامل:";

/// Build the user message for `text`. The text is embedded whole; nothing is
/// truncated to fit a context window.
pub fn build_prompt(text: &str) -> String {
    let taxonomy: Vec<String> = Category::ALL
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.label()))
        .collect();

    format!(
        "{INTRO}\n\n{}\n\n{COLUMNS}\n\n{FORMAT}\n\n{SCOPE}\n\n{TEXT_HEADING}\n{text}\n",
        taxonomy.join("\n")
    )
}
