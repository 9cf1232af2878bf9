//! Fixed instruction text for the opinion classifier.
//!
//! The model sorts a post into one of four risk categories or "其他"
//! (other) and answers with a small JSON object holding `结论` (verdict)
//! and `原因` (reason). Labelled reference cases are embedded to anchor
//! the output format and the judgement.

use crate::reference::ReferenceCase;

/// System message sent ahead of every classification prompt
pub const SYSTEM_PROMPT: &str = "你是一名面向品牌“霸王茶姬”的舆情分析专家。请以中文、客观、中立的方式，结合用户文本及图片摘要，基于提供的判断规则与参考案例，识别并归类负面客诉、数据泄露风险、黑灰产/薅羊毛、代下单等舆情类型。仅依据事实，不做主观推测；聚焦品牌相关实体、门店、产品、活动、优惠与下单方式等关键信息；若无明确关联则判为“其他”并简要说明原因。输出遵循用户消息中的格式要求。";

/// Render reference cases as numbered `<reference_case_N>` blocks
pub fn render_reference_cases(cases: &[ReferenceCase]) -> String {
    let mut rendered = String::new();

    for (i, case) in cases.iter().enumerate() {
        let n = i + 1;
        let input = case.input.as_deref().unwrap_or_default();
        let conclusion = case.conclusion.as_deref().unwrap_or_default();
        let reason = case.reason.as_deref().unwrap_or_default();

        rendered.push_str(&format!(
            r#"
<reference_case_{n}>
    需要甄别的内容：
    ```
    {input}
    ```
    实际甄别的输出结果：
    ```
    {{
        "结论": "{conclusion}",
        "原因": "{reason}",
    }}
    ```
</reference_case_{n}>
"#
        ));
    }

    rendered
}

/// Build the user prompt for `input` with the given reference cases
pub fn build_prompt(input: &str, cases: &[ReferenceCase]) -> String {
    let reference_cases = render_reference_cases(cases);

    format!(
        r#"
你现在是一个专业的舆情分析专家，专注于识别和分类文字内容中的舆情信息。请根据以下类别规则，对输入的文字内容进行判断，并给出明确结论。

<judge_rules>
类别 1：负面的舆情客诉信息，负面评价
    定义：用户针对产品、服务等表达不满、投诉或批评的内容。
    示例：抱怨服务质量差、产品有问题、体验不佳等。

类别 2：数据泄露风险
    定义：文字中提及数据被非法获取、不当传播、隐私泄露等相关内容。
    示例：提到系统漏洞导致信息泄露、个人隐私被公开、未经授权的数据访问等。

类别 3：黑灰产信息（工具开发，薅羊毛）
    定义：涉及利用工具、技术或手段非法获利、不正当获取利益的行为。
    示例：讨论如何利用漏洞获利、制作或销售作弊工具、薅取平台福利等。

类别 4：代下单
    定义：免费或者收费给予他人优惠券或者可指定地方下单自取，代替他人进行商品或服务下单的行为。
    示例：为他人代下单，并在宣传中诱导消费者参与，借助此行为薅取商家及平台推出的优惠福利。

其他：不属于上述任何类别
</judge_rules>

如果文字内容与上述四类无关，请明确指出原因。

<task_requirements>
    - 根据分析规则，明确指出这段文字属于哪个类别。
    - 若属于某类别，请简要说明原因（每条原因不超过 100 字）。
    - 若都不属于，请说明具体原因。
</task_requirements>

<reference_case_for_align_to>
{reference_cases}
</reference_case_for_align_to>

以下是你要甄别的文本内容：
{input}

<judge_result_format_requirements>
"结论"options = ["类别1", "类别2", "类别3", "类别4",  "其他"]

"原因"rules = "简洁清晰的解释"
</judge_result_format_requirements>

仅允许且必须按照如下格式输出(具体内容仅作示例)：
```
{{
    "结论": "类别1",
    "原因": "用户投诉奶茶饮用后出现身体不适症状（恶心、发烧、腹泻），属于负面客诉信息。"
}}
```
"#
    )
}
