use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, softmax, tanh},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TransformerIntentConfig {
    pub vocab_size:   usize,
    pub max_seq_len:  usize,
    pub num_classes:  usize,
    pub d_model:      usize,
    pub num_heads:    usize,
    pub num_layers:   usize,
    pub d_ff:         usize,
    pub dropout:      f64,
    /// Dropout between the pooled [CLS] state and the logits
    #[config(default = 0.5)]
    pub head_dropout: f64,
}

impl TransformerIntentConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerIntentModel<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm   = LayerNormConfig::new(self.d_model).init(device);
        let pooler       = LinearConfig::new(self.d_model, self.d_model).init(device);
        let classifier   = LinearConfig::new(self.d_model, self.num_classes).init(device);
        let dropout      = DropoutConfig::new(self.dropout).init();
        let head_dropout = DropoutConfig::new(self.head_dropout).init();
        TransformerIntentModel {
            token_embedding, position_embedding, layers,
            final_norm, pooler, classifier, dropout, head_dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `mask_pad` is true at padding positions, which attention ignores.
    pub fn forward(&self, x: Tensor<B, 3>, mask_pad: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(mask_pad);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(gelu(self.ffn_linear1.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

#[derive(Module, Debug)]
pub struct TransformerIntentModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub pooler:             Linear<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
    pub head_dropout:       Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TransformerIntentModel<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let mask_pad = input_ids.clone().equal_elem(0);

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, mask_pad.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]
        let [_, _, d_model] = x.dims();

        // Pool the [CLS] position, dense + tanh, dropout, project to intents.
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);
        let pooled = tanh(self.pooler.forward(cls));
        self.classifier.forward(self.head_dropout.forward(pooled))
    }

    /// Per-row probabilities over intents: [batch, num_classes]
    pub fn predict_proba(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        softmax(self.forward(input_ids), 1)
    }

    /// Mean cross-entropy over the batch, plus the logits.
    pub fn forward_loss(
        &self,
        input_ids: Tensor<B, 2, Int>,
        labels:    Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(input_ids);
        let ce     = CrossEntropyLossConfig::new().init(&logits.device());
        let loss   = ce.forward(logits.clone(), labels);
        (loss, logits)
    }
}
