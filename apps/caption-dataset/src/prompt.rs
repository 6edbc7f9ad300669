use svbrdf_stats::SvbrdfDescriptors;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Please use one sentence to describe the material in this image. Take note of the given characteristics of {descriptors}. Include a description of the lighting and roughness of the material. Be as specific as possible and make sure to condense your response into a single sentence.";

pub fn render_prompt(template: &str, descriptors: &SvbrdfDescriptors) -> String {
    let [specular, roughness, normals] = descriptors.labels();
    template
        .replace("{descriptors}", &descriptors.as_tuple())
        .replace("{specular}", specular)
        .replace("{roughness}", roughness)
        .replace("{normals}", normals)
}
