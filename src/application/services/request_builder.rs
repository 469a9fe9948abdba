//! Request Builder - 由模板和文本构造单轮对话请求

use crate::application::ports::{ChatMessage, InferenceRequest, SamplingParams};
use crate::domain::PromptTemplate;

/// 构造推理请求
///
/// 请求只包含一条 user 消息，内容为模板填充后的文本。
/// 输入原样插入，不做转义也不限制长度
pub fn build_request(
    template: &PromptTemplate,
    text: &str,
    model: &str,
    params: &SamplingParams,
) -> InferenceRequest {
    InferenceRequest::new(model, vec![ChatMessage::user(template.render(text))], *params)
}
