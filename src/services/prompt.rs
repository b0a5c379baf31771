//! 分类提示词

use crate::models::Category;

/// 系统消息
pub const SYSTEM_MESSAGE: &str =
    "You are an expert in classifying tweets about electric vehicles (EVs).";

/// 构建单条推文的分类提示词
pub fn build_classification_prompt(tweet: &str) -> String {
    let mut prompt = String::from("Classify the following tweet into one of these categories:\n\n");

    for category in Category::PROMPT_ORDER {
        prompt.push_str(&format!(
            "{}: {}: {}\n",
            category.code(),
            category.name(),
            category.description()
        ));
    }

    prompt.push_str(&format!(
        "\nTweet: {}\n\nProvide only the category number (1-8) or '0' for irrelevant.",
        tweet
    ));

    prompt
}
